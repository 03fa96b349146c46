//! CLI module for the itook AI helper
//!
//! Provides one subcommand per AI feature:
//! - `profile`: stream a character profile by name
//! - `scan`: identify a character from an image and stream its profile
//! - `recommend`: suggest titles for a viewer profile

pub mod profile;
pub mod recommend;
pub mod scan;

use std::io::Write;

use clap::{Parser, Subcommand};
use futures::StreamExt;

use crate::config::AppConfig;
use crate::domain::StreamFragment;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::services::{AiOrchestrator, FragmentStream};

/// itook AI - character profiles, image scans and recommendations
#[derive(Parser)]
#[command(name = "itook-ai")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Stream an AI profile for a character found by name
    Profile(profile::ProfileArgs),

    /// Identify the character in an image and stream its profile
    Scan(scan::ScanArgs),

    /// Recommend anime or manga titles
    Recommend(recommend::RecommendArgs),
}

/// Loads `.env` and configuration, starts logging and builds the orchestrator
pub(crate) fn bootstrap() -> anyhow::Result<AiOrchestrator> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    init_logging(&config.logging);

    Ok(AiOrchestrator::from_config(&config)?)
}

/// Writes fragments to stdout as they arrive
pub(crate) async fn print_stream(mut stream: FragmentStream) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();

    while let Some(fragment) = stream.next().await {
        match fragment {
            StreamFragment::Content { text } => write!(stdout, "{}", text)?,
            StreamFragment::Degraded { text, .. } => write!(stdout, "\n{}", text)?,
        }
        stdout.flush()?;
    }

    writeln!(stdout)?;
    Ok(())
}

/// Prints call counts and any soft warnings to stderr
pub(crate) fn print_usage(orchestrator: &AiOrchestrator) {
    for stats in orchestrator.usage_report() {
        eprintln!("{}", stats);
    }
    for warning in orchestrator.usage_warnings() {
        eprintln!("warning: {}", warning);
    }
}
