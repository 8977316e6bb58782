//! Order command implementation

use std::path::Path;

use miette::{IntoDiagnostic, Result};
use taskline_core::{Authority, Document};

use crate::cli::Cli;

pub fn run_order(cli: &Cli, file: &Path) -> Result<()> {
    let (mut engine, _) = super::open_engine(cli, file)?;
    engine.load_wrappers(Authority::Buffer).into_diagnostic()?;

    for line in engine.dependency_order().into_diagnostic()? {
        let text = engine.document().line(line).unwrap_or_default();
        println!("{}: {}", line + 1, text.trim());
    }
    Ok(())
}
