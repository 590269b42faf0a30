// ABOUTME: Entry point for the hangar CLI application.
// ABOUTME: Parses arguments, sets up logging, and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use hangar::error::Result;
use hangar::output::{Output, OutputMode};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // -v wins over RUST_LOG; otherwise RUST_LOG, then warn.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let output = Output::new(mode);

    if let Err(e) = run(cli.command, Output::new(mode)).await {
        output.error(&e.to_string());
        if let Some(hint) = e.hint() {
            output.detail(hint);
        }
        std::process::exit(1);
    }
}

async fn run(command: Commands, output: Output) -> Result<()> {
    match command {
        Commands::Deploy(args) => commands::deploy(args, output).await,
    }
}
