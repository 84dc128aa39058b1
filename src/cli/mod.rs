//! rslkit CLI - Command-line interface for RSL container tools

pub mod commands;

use clap::Parser;
use commands::Commands;

#[derive(Parser)]
#[command(name = "rslkit")]
#[command(about = "rslkit: RSL/RMHG container tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Run the rslkit CLI
pub fn run_cli() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    cli.command.execute()?;

    Ok(())
}
