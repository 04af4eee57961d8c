//! Main entry point for DeepL PDF Translator CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deepl_pdf_translator::cli::commands::{handle_translate, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables
    dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}={}", env!("CARGO_CRATE_NAME"), log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tokio::select! {
        result = handle_translate(cli) => {
            result?;
            Ok(ExitCode::SUCCESS)
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, abandoning the remaining files");
            eprintln!("\nInterrupted.");
            Ok(ExitCode::from(130))
        }
    }
}
