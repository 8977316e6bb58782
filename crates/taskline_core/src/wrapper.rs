//! Task wrappers: document lines bound to store tasks.

use std::collections::{BTreeSet, HashMap};

use taskline_cache::{LineCache, Resolver};
use taskline_parser::{LineParser, ParsedLine, TaskLine};
use tracing::{debug, warn};

use crate::document::{Document, parse_line};
use crate::identity::IdentityCache;
use crate::registry::{DEFAULT_STORE, StoreRegistry};
use crate::{Authority, Identity, SyncError, Task};

/// One document line that encodes a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskWrapper {
    /// Current position in the document. Always equals the wrapper's cache key.
    pub line_number: usize,
    /// Line text as it was when the wrapper was built.
    pub raw_text: String,
    /// Task fields as they should appear in the document.
    pub line: TaskLine,
    /// Resolved store name.
    pub store: String,
    /// Store snapshot, if the line refers to a known task.
    pub task: Option<Task>,
    /// Lines that must be saved before this one.
    pub add_dependencies: BTreeSet<usize>,
    /// Dependency uuids implied by child lines rather than written as `dep:`.
    pub implicit_depends: BTreeSet<String>,
}

impl TaskWrapper {
    /// Creates a wrapper for a parsed line with no snapshot and no dependencies.
    pub fn new(line_number: usize, raw_text: impl Into<String>, line: TaskLine) -> Self {
        let store = line.source.clone().unwrap_or_else(|| DEFAULT_STORE.to_string());
        Self {
            line_number,
            raw_text: raw_text.into(),
            line,
            store,
            task: None,
            add_dependencies: BTreeSet::new(),
            implicit_depends: BTreeSet::new(),
        }
    }

    pub fn uuid(&self) -> Option<&str> {
        self.line.uuid.as_deref()
    }

    /// Identity of the referenced task, unless the task is new.
    pub fn identity(&self) -> Option<Identity> {
        self.uuid().map(|uuid| Identity::new(&self.store, uuid))
    }

    pub fn depth(&self) -> usize {
        self.line.depth()
    }

    /// Canonical line text.
    pub fn render(&self) -> String {
        self.line.render()
    }

    /// Returns true if the document line differs from the canonical rendering.
    pub fn is_dirty(&self) -> bool {
        self.raw_text != self.render()
    }

    /// Builds the task to save, depending on `extra` besides the `dep:` uuids.
    ///
    /// Fields the line does not carry (project, tags) come from the snapshot.
    pub fn to_task(&self, extra: &BTreeSet<String>) -> Task {
        let mut task = self
            .task
            .clone()
            .unwrap_or_else(|| Task::new(String::new()));
        if let Some(uuid) = self.uuid() {
            task.uuid = uuid.to_string();
        }
        task.description = self.line.description.clone();
        task.status = self.line.status;
        task.priority = self.line.priority;
        task.depends = self
            .line
            .depends
            .iter()
            .cloned()
            .chain(extra.iter().cloned())
            .collect();
        task
    }

    /// Copies the task's fields onto the line. Implicit dependencies stay off
    /// the line.
    pub fn apply_task(&mut self, task: &Task) {
        if !task.uuid.is_empty() {
            self.line.uuid = Some(task.uuid.clone());
        }
        self.line.description = task.description.clone();
        self.line.status = task.status;
        self.line.priority = task.priority;
        self.line.depends = task
            .depends
            .iter()
            .filter(|uuid| !self.implicit_depends.contains(*uuid))
            .cloned()
            .collect();
        self.task = Some(task.clone());
    }
}

/// Builds the wrapper for a line position on a cache miss.
pub(crate) struct WrapperResolver<'a> {
    pub(crate) document: &'a dyn Document,
    pub(crate) parser: &'a dyn LineParser,
    pub(crate) lines: &'a mut LineCache<ParsedLine>,
    pub(crate) tasks: &'a IdentityCache,
    pub(crate) registry: &'a StoreRegistry,
    pub(crate) authority: Authority,
    /// Line of every task with a uuid, built on first use.
    uuid_index: Option<HashMap<Identity, usize>>,
}

impl<'a> WrapperResolver<'a> {
    pub(crate) fn new(
        document: &'a dyn Document,
        parser: &'a dyn LineParser,
        lines: &'a mut LineCache<ParsedLine>,
        tasks: &'a IdentityCache,
        registry: &'a StoreRegistry,
        authority: Authority,
    ) -> Self {
        Self {
            document,
            parser,
            lines,
            tasks,
            registry,
            authority,
            uuid_index: None,
        }
    }

    fn parse(&mut self, position: usize) -> Result<ParsedLine, SyncError> {
        parse_line(self.document, self.parser, self.lines, position)
    }

    /// Task lines directly beneath `position` that belong to `store`.
    ///
    /// The block ends at the first blank line or the first line indented no
    /// deeper than the parent. Direct children sit at the block's first depth.
    fn children(
        &mut self,
        position: usize,
        depth: usize,
        store: &str,
    ) -> Result<Vec<(usize, Option<String>)>, SyncError> {
        let mut children = Vec::new();
        let mut child_depth = None;

        for next in position + 1..self.document.line_count() {
            let parsed = self.parse(next)?;
            if parsed.is_blank() || parsed.depth() <= depth {
                break;
            }
            let child_depth = *child_depth.get_or_insert(parsed.depth());
            if let ParsedLine::Task(child) = parsed
                && child.depth() == child_depth
                && child.source.as_deref().unwrap_or(DEFAULT_STORE) == store
            {
                children.push((next, child.uuid));
            }
        }

        Ok(children)
    }

    fn line_of(&mut self, identity: &Identity) -> Result<Option<usize>, SyncError> {
        if self.uuid_index.is_none() {
            let mut index = HashMap::new();
            for position in 0..self.document.line_count() {
                if let ParsedLine::Task(task) = self.parse(position)?
                    && let Some(uuid) = task.uuid
                {
                    let store = task.source.unwrap_or_else(|| DEFAULT_STORE.to_string());
                    index.entry(Identity::new(store, uuid)).or_insert(position);
                }
            }
            self.uuid_index = Some(index);
        }
        Ok(self
            .uuid_index
            .as_ref()
            .and_then(|index| index.get(identity).copied()))
    }
}

impl Resolver<usize, TaskWrapper> for WrapperResolver<'_> {
    type Error = SyncError;

    fn resolve(&mut self, position: &usize) -> Result<Option<TaskWrapper>, SyncError> {
        let position = *position;
        let line = match self.parse(position)? {
            ParsedLine::Task(line) => line,
            _ => return Ok(None),
        };
        let raw_text = self
            .document
            .line(position)
            .ok_or_else(|| SyncError::position(position, self.document.line_count()))?
            .to_string();

        let store = self
            .registry
            .resolve_source(line.source.as_deref())?
            .name()
            .to_string();
        let mut wrapper = TaskWrapper::new(position, raw_text, line);
        wrapper.store = store.clone();

        for (child, uuid) in self.children(position, wrapper.depth(), &store)? {
            wrapper.add_dependencies.insert(child);
            wrapper.implicit_depends.extend(uuid);
        }

        for uuid in wrapper.line.depends.clone() {
            let identity = Identity::new(&store, uuid);
            if let Some(referent) = self.line_of(&identity)?
                && referent != position
            {
                wrapper.add_dependencies.insert(referent);
            }
        }

        if let Some(identity) = wrapper.identity() {
            match self.tasks.get(&identity) {
                Some(task) => wrapper.task = Some(task.clone()),
                None => warn!("Line {} refers to unknown task {}", position, identity),
            }
        }

        if self.authority == Authority::Store
            && let Some(task) = wrapper.task.clone()
        {
            wrapper.apply_task(&task);
        }

        debug!(
            "Built wrapper for line {} ({} dependencies)",
            position,
            wrapper.add_dependencies.len()
        );
        Ok(Some(wrapper))
    }
}
