//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Taskline - keep task lists in text files in sync with task stores
#[derive(Parser)]
#[command(name = "taskline")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Synchronize a task document with its stores
    Sync {
        /// Document to synchronize
        file: PathBuf,

        /// Let store values win over the document on conflicts
        #[arg(long)]
        store_wins: bool,

        /// Print the synchronized document without saving anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the order in which tasks would be saved
    Order {
        /// Document to inspect
        file: PathBuf,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },
}
