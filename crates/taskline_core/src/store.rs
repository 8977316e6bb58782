//! External task store connector interface.

use std::collections::{BTreeMap, BTreeSet};

use taskline_parser::Filter;
use tracing::debug;

use crate::{SyncError, Task};

/// A connection to an external task store.
///
/// Every call is a blocking round trip; callers batch to keep the number of
/// calls low.
pub trait TaskStore {
    /// Fetches one task. Fails with [`SyncError::NotFound`] if absent.
    fn fetch(&self, uuid: &str) -> Result<Task, SyncError>;

    /// Fetches every task whose uuid is in `uuids`. Missing uuids are skipped.
    fn filter(&self, uuids: &BTreeSet<String>) -> Result<Vec<Task>, SyncError>;

    /// Returns every task matching `filter`.
    fn query(&self, filter: &Filter) -> Result<Vec<Task>, SyncError>;

    /// Persists a task, returning the stored version. New tasks get a uuid.
    fn save(&self, task: Task) -> Result<Task, SyncError>;

    /// Stops applying any ambient context filter to reads.
    fn disable_context(&self);
}

/// Task table shared by the bundled connectors.
#[derive(Debug, Clone, Default)]
pub(crate) struct TaskTable {
    store: String,
    tasks: BTreeMap<String, Task>,
    context: Option<Filter>,
}

impl TaskTable {
    pub(crate) fn new(store: impl Into<String>, tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            store: store.into(),
            tasks: tasks
                .into_iter()
                .map(|task| (task.uuid.clone(), task))
                .collect(),
            context: None,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.store
    }

    pub(crate) fn set_context(&mut self, context: Option<Filter>) {
        self.context = context.filter(|filter| !filter.is_empty());
    }

    pub(crate) fn context(&self) -> Option<&Filter> {
        self.context.as_ref()
    }

    fn visible(&self, task: &Task) -> bool {
        self.context
            .as_ref()
            .is_none_or(|context| task.matches(context))
    }

    pub(crate) fn fetch(&self, uuid: &str) -> Result<Task, SyncError> {
        self.tasks
            .get(uuid)
            .filter(|task| self.visible(task))
            .cloned()
            .ok_or_else(|| SyncError::not_found(&self.store, uuid))
    }

    pub(crate) fn filter(&self, uuids: &BTreeSet<String>) -> Vec<Task> {
        uuids
            .iter()
            .filter_map(|uuid| self.tasks.get(uuid))
            .filter(|task| self.visible(task))
            .cloned()
            .collect()
    }

    pub(crate) fn query(&self, filter: &Filter) -> Vec<Task> {
        let filter = match &self.context {
            Some(context) => context.and(filter),
            None => filter.clone(),
        };
        self.tasks
            .values()
            .filter(|task| task.matches(&filter))
            .cloned()
            .collect()
    }

    /// Validates and stores a task. Dependencies must already be stored.
    pub(crate) fn save(&mut self, mut task: Task) -> Result<Task, SyncError> {
        if task.description.trim().is_empty() {
            return Err(SyncError::store_write(
                &self.store,
                "task description must not be empty",
            ));
        }

        if let Some(missing) = task
            .depends
            .iter()
            .find(|uuid| *uuid == &task.uuid || !self.tasks.contains_key(*uuid))
        {
            return Err(SyncError::store_write(
                &self.store,
                format!("unknown dependency '{}'", missing),
            ));
        }

        if task.is_new() {
            task.uuid = uuid::Uuid::new_v4().to_string();
            debug!("Assigned uuid {} in store '{}'", task.uuid, self.store);
        }

        self.tasks.insert(task.uuid.clone(), task.clone());
        Ok(task)
    }

    pub(crate) fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }
}
