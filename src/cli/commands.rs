//! CLI definition and the translate handler

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::core::client::DocumentTranslator;
use crate::core::config::TranslatorConfig;
use crate::core::models::{BatchSummary, FileOutcome, FileResult, FileTask};
use crate::processors::batch::{BatchProgress, BatchTranslator};

/// Translate a directory tree of PDF documents with DeepL
#[derive(Parser, Debug, Clone)]
#[command(name = "deepl-pdf-translator", version, about, long_about = None)]
pub struct Cli {
    /// Directory containing the documents to translate
    pub input_dir: PathBuf,

    /// Directory that receives the translated documents
    pub output_dir: PathBuf,

    /// Target language code, e.g. EN, DE, EN-GB (default: EN)
    #[arg(long = "target_lang", visible_alias = "target-lang")]
    pub target_lang: Option<String>,

    /// Source language code (auto-detect if not specified)
    #[arg(long = "source-lang")]
    pub source_lang: Option<String>,

    /// File suffix to translate (default: pdf)
    #[arg(long)]
    pub extension: Option<String>,

    /// JSON, YAML or TOML file with translator settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// DeepL API key (defaults to the DEEPL_API_KEY env var)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Delay between status checks in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Give up on a document after this many seconds (0 waits forever)
    #[arg(long)]
    pub max_wait_secs: Option<u64>,

    /// Leave files alone whose translated output already exists
    #[arg(long)]
    pub skip_existing: bool,

    /// Write a JSON summary of the run to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Load layered configuration and apply command-line overrides
    pub fn resolve_config(&self) -> crate::core::errors::Result<TranslatorConfig> {
        let mut config = TranslatorConfig::load(self.config.as_deref())?;

        if let Some(api_key) = &self.api_key {
            config.api_key = api_key.clone();
        }
        if let Some(target_lang) = &self.target_lang {
            config.target_lang = target_lang.clone();
        }
        if let Some(source_lang) = &self.source_lang {
            config.source_lang = Some(source_lang.clone());
        }
        if let Some(extension) = &self.extension {
            config.extension = extension.clone();
        }
        if let Some(poll_interval_ms) = self.poll_interval_ms {
            config.poll_interval_ms = poll_interval_ms;
            config.max_poll_interval_ms = config.max_poll_interval_ms.max(poll_interval_ms);
        }
        if let Some(max_wait_secs) = self.max_wait_secs {
            config.max_wait_secs = max_wait_secs;
        }
        if self.skip_existing {
            config.skip_existing = true;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Progress bar plus one printed line per finished file
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Arc::new(Self { bar })
    }
}

impl BatchProgress for CliProgress {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
    }

    fn on_file_start(&self, _index: usize, task: &FileTask) {
        self.bar
            .set_message(format!("Processing: {}", task.input.display()));
    }

    fn on_file_complete(&self, _index: usize, outcome: &FileOutcome) {
        match &outcome.result {
            FileResult::Translated { .. } => {}
            FileResult::Skipped => self
                .bar
                .println(format!("Skipped {} (output exists)", outcome.input.display())),
            FileResult::Failed { error } => self.bar.println(format!(
                "Failed to translate {}: {}",
                outcome.input.display(),
                error
            )),
        }
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _summary: &BatchSummary) {
        self.bar.finish_with_message("Completed");
    }
}

/// Handle the translate command
pub async fn handle_translate(cli: Cli) -> anyhow::Result<BatchSummary> {
    let start_time = Instant::now();
    let config = cli.resolve_config()?;

    info!("Starting document translation");
    info!("Input: {}", cli.input_dir.display());
    info!("Output: {}", cli.output_dir.display());
    info!("Target language: {}", config.target_lang);

    let translator = DocumentTranslator::new(config)?;
    let batch = BatchTranslator::new(translator, &cli.input_dir, &cli.output_dir)
        .with_progress(CliProgress::new());

    let summary = batch.run().await?;

    if let Some(report) = &cli.report {
        summary.save(report).await?;
        info!("Report written to {}", report.display());
    }

    let duration = start_time.elapsed();
    println!("\n✅ Translation completed!");
    println!("   Translated: {}", summary.translated());
    if summary.skipped() > 0 {
        println!("   Skipped: {}", summary.skipped());
    }
    println!("   Failed: {}", summary.failed());
    println!("   Time: {:?}", duration);

    for failure in summary.failures() {
        if let FileResult::Failed { error } = &failure.result {
            eprintln!("   ✗ {}: {}", failure.input.display(), error);
        }
    }

    Ok(summary)
}
