//! Viewports: document lines defining a saved query.

use std::collections::BTreeSet;

use taskline_cache::{LineCache, Resolver};
use taskline_parser::{Filter, LineParser, ParsedLine, ViewSpec};
use tracing::debug;

use crate::document::{Document, parse_line};
use crate::registry::{StoreConnection, StoreRegistry};
use crate::{Identity, SyncError, Task};

/// A view line and the tasks currently matching its filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewPort {
    /// Current position in the document. Always equals the viewport's cache key.
    pub line_number: usize,
    pub name: String,
    pub filter: Filter,
    /// Explicit store reference from the view line.
    pub source: Option<String>,
    /// Resolved store name.
    pub store: String,
    pub viewport_tasks: BTreeSet<Identity>,
}

impl ViewPort {
    pub fn from_spec(line_number: usize, spec: ViewSpec, store: impl Into<String>) -> Self {
        Self {
            line_number,
            name: spec.name,
            filter: spec.filter,
            source: spec.source,
            store: store.into(),
            viewport_tasks: BTreeSet::new(),
        }
    }

    /// Queries the store and records the matching identities.
    pub fn load_tasks(&mut self, connection: &StoreConnection) -> Result<Vec<Task>, SyncError> {
        let tasks = connection.handle().query(&self.filter)?;
        self.viewport_tasks = tasks
            .iter()
            .map(|task| Identity::new(connection.name(), &task.uuid))
            .collect();
        debug!(
            "Viewport '{}' on line {} matches {} tasks",
            self.name,
            self.line_number,
            tasks.len()
        );
        Ok(tasks)
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.viewport_tasks.contains(identity)
    }

    /// Canonical view line.
    pub fn header(&self) -> String {
        let mut inner = self.filter.to_string();
        if let Some(source) = &self.source {
            if !inner.is_empty() {
                inner.push(' ');
            }
            inner.push('@');
            inner.push_str(source);
        }
        if inner.is_empty() {
            format!("== {} ==", self.name)
        } else {
            format!("== {} | {} ==", self.name, inner)
        }
    }
}

/// Builds the viewport for a line position on a cache miss.
pub(crate) struct ViewResolver<'a> {
    pub(crate) document: &'a dyn Document,
    pub(crate) parser: &'a dyn LineParser,
    pub(crate) lines: &'a mut LineCache<ParsedLine>,
    pub(crate) registry: &'a StoreRegistry,
}

impl Resolver<usize, ViewPort> for ViewResolver<'_> {
    type Error = SyncError;

    fn resolve(&mut self, position: &usize) -> Result<Option<ViewPort>, SyncError> {
        match parse_line(self.document, self.parser, self.lines, *position)? {
            ParsedLine::View(spec) => {
                let store = self
                    .registry
                    .resolve_source(spec.source.as_deref())?
                    .name()
                    .to_string();
                Ok(Some(ViewPort::from_spec(*position, spec, store)))
            }
            _ => Ok(None),
        }
    }
}
