//! Scan command - identifies a character from an image file

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use super::{bootstrap, print_stream, print_usage};
use crate::infrastructure::services::ScanOutcome;

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Image file (PNG, JPEG, GIF or WEBP)
    pub image: PathBuf,
}

pub async fn run(args: ScanArgs) -> anyhow::Result<()> {
    let image = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("Failed to read {}", args.image.display()))?;

    let orchestrator = bootstrap()?;

    match orchestrator.scan_character(image).await? {
        ScanOutcome::Unidentified => println!("Could not identify the character."),
        ScanOutcome::NotInCatalog(name) => {
            println!("Looks like {}, but the catalog has no entry for them.", name)
        }
        ScanOutcome::Profile { record, stream } => {
            println!("# {}", record.name);
            print_stream(stream).await?;
        }
    }

    print_usage(&orchestrator);
    Ok(())
}
