//! Custom error types for document translation

use thiserror::Error;

/// Translation-related errors
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Document submission was rejected
    #[error("Upload failed: {status} - {message}")]
    UploadError {
        status: u16,
        message: String,
    },

    /// Status request was rejected
    #[error("Status check failed: {status} - {message}")]
    StatusError {
        status: u16,
        message: String,
    },

    /// Result download was rejected
    #[error("Download failed: {status} - {message}")]
    DownloadError {
        status: u16,
        message: String,
    },

    /// The service reported the job as failed
    #[error("Translation failed: {message}")]
    TranslationFailed {
        document_id: String,
        message: String,
    },

    /// The job did not finish within the configured wait
    #[error("Document {document_id} still not done after {waited_secs}s ({attempts} status checks)")]
    PollTimeout {
        document_id: String,
        waited_secs: u64,
        attempts: u32,
    },

    /// Network error
    #[error("Network error: {message}")]
    NetworkError {
        message: String,
    },

    /// Invalid response from API
    #[error("Invalid response: {message}")]
    InvalidResponseError {
        message: String,
    },

    /// File operation error
    #[error("File error: {path} - {message}")]
    FileError {
        path: String,
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Reqwest error
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl TranslationError {
    /// Whether the error happened before any work could start
    pub fn is_config(&self) -> bool {
        matches!(self, TranslationError::ConfigError { .. })
    }
}

impl From<config::ConfigError> for TranslationError {
    fn from(err: config::ConfigError) -> Self {
        TranslationError::ConfigError {
            message: err.to_string(),
        }
    }
}

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslationError>;
