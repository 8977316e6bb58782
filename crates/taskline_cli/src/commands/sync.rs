//! Sync command implementation

use std::fs;
use std::path::Path;

use miette::{IntoDiagnostic, Result};
use tracing::info;
use taskline_core::Authority;

use crate::cli::Cli;

/// Synchronizes `file`. With `dry_run`, prints the result instead and
/// reports whether the document would change.
pub fn run_sync(cli: &Cli, file: &Path, store_wins: bool, dry_run: bool) -> Result<bool> {
    let (mut engine, original) = super::open_engine(cli, file)?;
    let authority = if store_wins {
        Authority::Store
    } else {
        Authority::Buffer
    };

    engine.batch_load_identities().into_diagnostic()?;
    engine.load_wrappers(authority).into_diagnostic()?;
    engine.load_viewports().into_diagnostic()?;
    let changes = engine.evaluate_viewports().into_diagnostic()?;
    // Lines added by viewports come straight from the store.
    engine.load_wrappers(authority).into_diagnostic()?;

    if dry_run {
        engine.render_wrappers();
        let text = engine.into_document().to_text();
        print!("{}", text);
        return Ok(text != original);
    }

    let saved = engine.save_in_dependency_order().into_diagnostic()?;
    engine.render_wrappers();
    let text = engine.into_document().to_text();
    if text != original {
        fs::write(file, &text).into_diagnostic()?;
        info!("Updated {}", file.display());
    }

    info!(
        "Synced {} tasks ({} lines added, {} removed by viewports)",
        saved.len(),
        changes.added,
        changes.removed
    );
    Ok(false)
}
