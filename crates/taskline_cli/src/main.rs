//! Taskline CLI
//!
//! Keeps task lists in text files in sync with task stores.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use miette::Result;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(pending) => {
            if pending {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

/// Runs a command. `Ok(true)` means the command found pending changes.
fn run(cli: Cli) -> Result<bool> {
    match &cli.command {
        Commands::Sync {
            file,
            store_wins,
            dry_run,
        } => commands::sync::run_sync(&cli, file, *store_wins, *dry_run),
        Commands::Order { file } => commands::order::run_order(&cli, file).map(|_| false),
        Commands::Init { force } => commands::init::run_init(*force).map(|_| false),
    }
}
