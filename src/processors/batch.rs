//! Directory walker that translates every matching document under a root

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::core::client::DocumentTranslator;
use crate::core::errors::{Result, TranslationError};
use crate::core::models::{BatchSummary, FileOutcome, FileResult, FileTask};

/// Receives events while a batch runs.
///
/// All methods default to no-ops so implementors only override what they
/// need. Files are processed one at a time, so calls never overlap.
pub trait BatchProgress: Send + Sync {
    /// Called once after the input tree has been scanned
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before a file is uploaded
    fn on_file_start(&self, index: usize, task: &FileTask) {
        let _ = (index, task);
    }

    /// Called after a file is translated, skipped or failed
    fn on_file_complete(&self, index: usize, outcome: &FileOutcome) {
        let _ = (index, outcome);
    }

    /// Called once all files have been handled
    fn on_batch_complete(&self, summary: &BatchSummary) {
        let _ = summary;
    }
}

/// Progress sink that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl BatchProgress for NoProgress {}

/// Mirrors an input tree into an output tree of translated documents
#[derive(Clone)]
pub struct BatchTranslator {
    translator: DocumentTranslator,
    input_root: PathBuf,
    output_root: PathBuf,
    progress: Arc<dyn BatchProgress>,
}

impl std::fmt::Debug for BatchTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchTranslator")
            .field("input_root", &self.input_root)
            .field("output_root", &self.output_root)
            .finish_non_exhaustive()
    }
}

impl BatchTranslator {
    /// Create a new batch translator
    pub fn new(
        translator: DocumentTranslator,
        input_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            translator,
            input_root: input_root.into(),
            output_root: output_root.into(),
            progress: Arc::new(NoProgress),
        }
    }

    /// Attach a progress sink
    pub fn with_progress(mut self, progress: Arc<dyn BatchProgress>) -> Self {
        self.progress = progress;
        self
    }

    /// Find matching documents under the input root, recursively
    pub fn find_files(&self) -> Result<Vec<PathBuf>> {
        if !self.input_root.is_dir() {
            return Err(TranslationError::FileError {
                path: self.input_root.display().to_string(),
                message: "Not a directory".to_string(),
            });
        }

        let extension = self.translator.config().normalized_extension();
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(&self.input_root)
            .sort_by_file_name()
            .into_iter()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if entry.file_type().is_file() && has_extension(path, &extension) {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }

    /// Mirrored output location for a file under the input root
    pub fn output_path_for(&self, input: &Path) -> Result<PathBuf> {
        let relative = input
            .strip_prefix(&self.input_root)
            .map_err(|_| TranslationError::FileError {
                path: input.display().to_string(),
                message: format!("not under {}", self.input_root.display()),
            })?;
        Ok(self.output_root.join(relative))
    }

    /// Build one task per discovered file
    pub fn plan(&self) -> Result<Vec<FileTask>> {
        let target_lang = &self.translator.config().target_lang;
        self.find_files()?
            .into_iter()
            .map(|input| {
                let output = self.output_path_for(&input)?;
                Ok(FileTask::new(input, output, target_lang.clone()))
            })
            .collect()
    }

    /// Translate one file; failures are captured in the outcome
    pub async fn process(&self, task: &FileTask) -> FileOutcome {
        let start = Instant::now();
        let result = self.process_inner(task).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let result = match result {
            Ok(result) => {
                if let FileResult::Translated { bytes_written, .. } = &result {
                    info!(
                        "Translated {} -> {} ({} bytes)",
                        task.input.display(),
                        task.output.display(),
                        bytes_written
                    );
                }
                result
            }
            Err(e) => {
                warn!("Failed to translate {}: {}", task.input.display(), e);
                FileResult::Failed {
                    error: e.to_string(),
                }
            }
        };

        FileOutcome {
            input: task.input.clone(),
            output: task.output.clone(),
            result,
            elapsed_ms,
        }
    }

    async fn process_inner(&self, task: &FileTask) -> Result<FileResult> {
        if self.translator.config().skip_existing && task.output.exists() {
            info!("Skipping {}: output already exists", task.input.display());
            return Ok(FileResult::Skipped);
        }

        if let Some(parent) = task.output.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TranslationError::FileError {
                    path: parent.display().to_string(),
                    message: e.to_string(),
                })?;
        }

        let translated = self.translator.translate_document(task).await?;
        Ok(FileResult::Translated {
            bytes_written: translated.bytes_written,
            billed_characters: translated.billed_characters,
        })
    }

    /// Translate every matching file in order and summarise the run
    pub async fn run(&self) -> Result<BatchSummary> {
        let started_at = Utc::now();
        let tasks = self.plan()?;

        info!(
            "Found {} .{} files under {}",
            tasks.len(),
            self.translator.config().normalized_extension(),
            self.input_root.display()
        );
        self.progress.on_batch_start(tasks.len());

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (index, task) in tasks.iter().enumerate() {
            self.progress.on_file_start(index, task);
            let outcome = self.process(task).await;
            self.progress.on_file_complete(index, &outcome);
            outcomes.push(outcome);
        }

        let summary = BatchSummary {
            input_root: self.input_root.clone(),
            output_root: self.output_root.clone(),
            target_lang: self.translator.config().target_lang.clone(),
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };

        info!(
            "Completed: {} translated, {} skipped, {} failed",
            summary.translated(),
            summary.skipped(),
            summary.failed()
        );
        self.progress.on_batch_complete(&summary);

        Ok(summary)
    }
}

/// Case-insensitive suffix check
fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase() == extension)
        .unwrap_or(false)
}
