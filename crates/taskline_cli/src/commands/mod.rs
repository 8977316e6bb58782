//! Command implementations

pub mod init;
pub mod order;
pub mod sync;

use std::fs;
use std::path::Path;

use miette::{IntoDiagnostic, Result};
use tracing::info;
use taskline_core::{FileConnector, LineBuffer, StoreRegistry, SyncConfig, SyncEngine};

use crate::cli::Cli;

/// Loads the configuration named on the command line, or the one found in
/// the working directory, or the defaults.
fn load_config(cli: &Cli) -> Result<SyncConfig> {
    if let Some(path) = &cli.config {
        return SyncConfig::from_file(path).into_diagnostic();
    }
    if let Some(path) = SyncConfig::discover(".") {
        info!("Using config: {}", path.display());
        return SyncConfig::from_file(&path).into_diagnostic();
    }

    info!("No config file found, using defaults");
    Ok(SyncConfig::new())
}

/// Reads `file` and connects every configured store.
fn open_engine(cli: &Cli, file: &Path) -> Result<(SyncEngine<LineBuffer>, String)> {
    let config = load_config(cli)?;
    let registry = StoreRegistry::from_config(&config, &FileConnector).into_diagnostic()?;
    let text = fs::read_to_string(file)
        .map_err(|e| miette::miette!("Failed to read {}: {}", file.display(), e))?;
    let engine = SyncEngine::new(LineBuffer::from_text(&text), registry);
    Ok((engine, text))
}
