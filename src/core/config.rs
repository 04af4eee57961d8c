//! Configuration management

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::errors::{Result, TranslationError};

/// Endpoint for free-tier credentials (keys ending in `:fx`)
pub const FREE_API_URL: &str = "https://api-free.deepl.com/v2";

/// Endpoint for standard credentials
pub const PRO_API_URL: &str = "https://api.deepl.com/v2";

/// Prefix for environment overrides, e.g. `DEEPL_API_KEY`
pub const ENV_PREFIX: &str = "DEEPL";

static LANG_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{2,4})?$").expect("valid regex"));

/// Configuration for translator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub api_key: String,
    /// Explicit base URL, bypasses the free/pro selection
    pub api_url: Option<String>,
    pub target_lang: String,
    pub source_lang: Option<String>,
    /// File suffix to pick up, without the dot
    pub extension: String,
    pub poll_interval_ms: u64,
    /// Multiplier applied to the poll interval after each check
    pub poll_backoff: f64,
    pub max_poll_interval_ms: u64,
    /// Upper bound on waiting for one document; 0 waits forever
    pub max_wait_secs: u64,
    pub timeout_ms: u64,
    pub skip_existing: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: None,
            target_lang: "EN".to_string(),
            source_lang: None,
            extension: "pdf".to_string(),
            poll_interval_ms: 5000,
            poll_backoff: 1.0,
            max_poll_interval_ms: 60000,
            max_wait_secs: 1800,
            timeout_ms: 120000,
            skip_existing: false,
        }
    }
}

impl TranslatorConfig {
    /// Create a config around an explicit credential
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Load configuration from `DEEPL_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Load defaults, then the optional file, then the environment
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let env = config::Environment::with_prefix(ENV_PREFIX).try_parsing(true);
        Self::load_sources(config_file, Some(env))
    }

    /// Load from a JSON, YAML or TOML file only
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_sources(Some(path.as_ref()), None)
    }

    fn load_sources(config_file: Option<&Path>, env: Option<config::Environment>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_file {
            if !path.is_file() {
                return Err(TranslationError::ConfigError {
                    message: format!("config file not found: {}", path.display()),
                });
            }
            info!("Loading configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path));
        }

        if let Some(env) = env {
            builder = builder.add_source(env);
        }

        let config: Self = builder.build()?.try_deserialize()?;
        debug!(
            "Loaded configuration: target_lang={}, extension={}, free_tier={}",
            config.target_lang,
            config.extension,
            config.is_free_tier()
        );
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(config_error(format!(
                "{}_API_KEY environment variable is required",
                ENV_PREFIX
            )));
        }

        if !LANG_CODE.is_match(&self.target_lang) {
            return Err(config_error(format!(
                "invalid target language code: {:?}",
                self.target_lang
            )));
        }

        if let Some(source) = &self.source_lang {
            if !LANG_CODE.is_match(source) {
                return Err(config_error(format!("invalid source language code: {:?}", source)));
            }
        }

        if self.extension.trim_start_matches('.').is_empty() {
            return Err(config_error("extension must not be empty".to_string()));
        }

        if self.poll_interval_ms == 0 {
            return Err(config_error("poll_interval_ms must be greater than 0".to_string()));
        }

        if !self.poll_backoff.is_finite() || self.poll_backoff < 1.0 {
            return Err(config_error(
                "poll_backoff must be a finite value of at least 1.0".to_string(),
            ));
        }

        if self.max_poll_interval_ms < self.poll_interval_ms {
            return Err(config_error(
                "max_poll_interval_ms must not be below poll_interval_ms".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether the credential belongs to the free tier
    pub fn is_free_tier(&self) -> bool {
        self.api_key.ends_with(":fx")
    }

    /// API base URL without trailing slash
    pub fn base_url(&self) -> &str {
        match &self.api_url {
            Some(url) => url.trim_end_matches('/'),
            None if self.is_free_tier() => FREE_API_URL,
            None => PRO_API_URL,
        }
    }

    /// Suffix filter, normalised to lowercase without a leading dot
    pub fn normalized_extension(&self) -> String {
        self.extension.trim_start_matches('.').to_lowercase()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Next wait after `current`, grown by the backoff factor and capped
    pub fn next_poll_interval(&self, current: Duration) -> Duration {
        let max = Duration::from_millis(self.max_poll_interval_ms);
        Duration::try_from_secs_f64(current.as_secs_f64() * self.poll_backoff)
            .unwrap_or(max)
            .min(max)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        (self.max_wait_secs > 0).then(|| Duration::from_secs(self.max_wait_secs))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Serialises tests that touch `DEEPL_*` variables
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

fn config_error(message: String) -> TranslationError {
    TranslationError::ConfigError { message }
}
