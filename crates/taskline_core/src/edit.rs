//! Structural edits that keep position-keyed caches in step with the document.

use std::collections::BTreeSet;

use tracing::debug;

use crate::document::Document;
use crate::engine::SyncEngine;
use crate::SyncError;

impl<D: Document> SyncEngine<D> {
    /// Inserts a line so that it ends up at `position`. Appending is allowed.
    pub fn insert_line(&mut self, text: impl Into<String>, position: usize) -> Result<(), SyncError> {
        let len = self.document.line_count();
        if position > len {
            return Err(SyncError::position(position, len));
        }

        self.document.insert_line(position, text.into());

        let shift = |line: usize| if line >= position { line + 1 } else { line };
        for wrapper in self.wrappers.values_mut() {
            wrapper.line_number = shift(wrapper.line_number);
            wrapper.add_dependencies = wrapper.add_dependencies.iter().map(|&l| shift(l)).collect();
        }
        for viewport in self.viewports.values_mut() {
            viewport.line_number = shift(viewport.line_number);
        }
        self.rekey();

        debug!("Inserted line {}", position);
        Ok(())
    }

    /// Deletes the line at `position` along with its wrapper and viewport.
    pub fn remove_line(&mut self, position: usize) -> Result<String, SyncError> {
        let len = self.document.line_count();
        if position >= len {
            return Err(SyncError::position(position, len));
        }

        let text = self.document.delete_line(position);
        self.wrappers.take(&position);
        self.viewports.take(&position);

        let shift = |line: usize| if line > position { line - 1 } else { line };
        for wrapper in self.wrappers.values_mut() {
            wrapper.line_number = shift(wrapper.line_number);
            wrapper.add_dependencies = wrapper
                .add_dependencies
                .iter()
                .filter(|&&line| line != position)
                .map(|&line| shift(line))
                .collect();
        }
        for viewport in self.viewports.values_mut() {
            viewport.line_number = shift(viewport.line_number);
        }
        self.rekey();

        debug!("Removed line {}", position);
        Ok(text)
    }

    /// Exchanges two lines together with their cached wrappers and viewports.
    ///
    /// Only the two positions are read; no other line is parsed.
    pub fn swap_lines(&mut self, first: usize, second: usize) -> Result<(), SyncError> {
        let len = self.document.line_count();
        for position in [first, second] {
            if position >= len {
                return Err(SyncError::position(position, len));
            }
        }
        if first == second {
            return Ok(());
        }

        let first_text = self.line_text(first)?;
        let second_text = self.line_text(second)?;
        self.document.set_line(first, second_text);
        self.document.set_line(second, first_text);

        self.wrappers.swap(first, second);
        self.viewports.swap(first, second);

        for position in [first, second] {
            if let Some(wrapper) = self.wrappers.get_mut(&position) {
                wrapper.line_number = position;
            }
            if let Some(viewport) = self.viewports.get_mut(&position) {
                viewport.line_number = position;
            }
        }

        let swap = |line: usize| match line {
            l if l == first => second,
            l if l == second => first,
            l => l,
        };
        for wrapper in self.wrappers.values_mut() {
            if wrapper.add_dependencies.contains(&first) || wrapper.add_dependencies.contains(&second) {
                wrapper.add_dependencies = wrapper
                    .add_dependencies
                    .iter()
                    .map(|&line| swap(line))
                    .collect::<BTreeSet<_>>();
            }
        }

        debug!("Swapped lines {} and {}", first, second);
        Ok(())
    }

    fn line_text(&self, position: usize) -> Result<String, SyncError> {
        self.document
            .line(position)
            .map(str::to_string)
            .ok_or_else(|| SyncError::position(position, self.document.line_count()))
    }

    /// Re-keys wrappers and viewports from their own line numbers.
    fn rekey(&mut self) {
        self.wrappers.rekey(|wrapper| wrapper.line_number);
        self.viewports.rekey(|viewport| viewport.line_number);
    }
}
