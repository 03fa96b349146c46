//! Profile command - streams a character profile by name

use clap::Args;

use super::{bootstrap, print_stream, print_usage};

#[derive(Args, Debug)]
pub struct ProfileArgs {
    /// Character name to look up in the catalog
    #[arg(long)]
    pub name: String,
}

pub async fn run(args: ProfileArgs) -> anyhow::Result<()> {
    let orchestrator = bootstrap()?;

    match orchestrator.find_character(&args.name).await? {
        Some(record) => {
            println!("# {}", record.name);
            print_stream(orchestrator.analyze_character(&record)).await?;
        }
        None => println!("No character named '{}' in the catalog.", args.name),
    }

    print_usage(&orchestrator);
    Ok(())
}
