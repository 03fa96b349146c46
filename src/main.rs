use clap::Parser;
use itook_ai::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Profile(args) => cli::profile::run(args).await,
        Command::Scan(args) => cli::scan::run(args).await,
        Command::Recommend(args) => cli::recommend::run(args).await,
    }
}
