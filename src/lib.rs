//! DeepL PDF Translator - batch document translation library
//!
//! This library walks a directory tree, submits every matching document to the
//! DeepL document API, waits for each job and mirrors the translated files into
//! an output tree.

#![forbid(unsafe_code)]

pub mod cli;
pub mod core;
pub mod processors;

// Re-export key types for convenience
pub use core::{
    client::{DocumentTranslator, TranslatedDocument},
    config::TranslatorConfig,
    errors::{Result, TranslationError},
    models::{BatchSummary, DocumentHandle, DocumentStatus, FileOutcome, FileResult, FileTask, JobState},
};

pub use processors::batch::{BatchProgress, BatchTranslator, NoProgress};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
