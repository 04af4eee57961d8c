//! Core data models for document translation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::errors::Result;

/// Identifies a submitted document on the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHandle {
    pub document_id: String,
    pub document_key: String,
}

/// Job state as reported by the status endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobState {
    Queued,
    Translating,
    InProgress,
    Done,
    Error,
    /// Any status string the service may add later
    #[serde(other)]
    Unknown,
}

impl JobState {
    /// Only `done` and `error` end polling
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Error)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Queued => write!(f, "queued"),
            JobState::Translating => write!(f, "translating"),
            JobState::InProgress => write!(f, "in-progress"),
            JobState::Done => write!(f, "done"),
            JobState::Error => write!(f, "error"),
            JobState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Body of a status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStatus {
    #[serde(default)]
    pub document_id: Option<String>,
    pub status: JobState,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub seconds_remaining: Option<u64>,
    #[serde(default)]
    pub billed_characters: Option<u64>,
}

/// One discovered file and where its translation goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub input: PathBuf,
    pub output: PathBuf,
    pub target_lang: String,
}

impl FileTask {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, target_lang: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            target_lang: target_lang.into(),
        }
    }
}

/// What happened to a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum FileResult {
    Translated {
        bytes_written: u64,
        billed_characters: Option<u64>,
    },
    Skipped,
    Failed {
        error: String,
    },
}

/// Per-file result collected by the batch walker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(flatten)]
    pub result: FileResult,
    pub elapsed_ms: u64,
}

impl FileOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self.result, FileResult::Failed { .. })
    }
}

/// Aggregated result of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub target_lang: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn translated(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, FileResult::Translated { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, FileResult::Skipped))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    /// Outcomes that ended in an error
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    /// Write the summary as pretty JSON
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}
