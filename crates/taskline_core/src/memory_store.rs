//! In-memory task store.

use std::collections::BTreeSet;

use parking_lot::Mutex;
use taskline_parser::Filter;

use crate::store::{TaskStore, TaskTable};
use crate::{SyncError, Task};

/// Number of calls made against a store, per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    pub fetch: usize,
    pub filter: usize,
    pub query: usize,
    pub save: usize,
}

impl CallStats {
    /// Number of read calls.
    pub fn reads(&self) -> usize {
        self.fetch + self.filter + self.query
    }

    /// Number of calls of any kind.
    pub fn total(&self) -> usize {
        self.reads() + self.save
    }
}

/// A task store held in memory.
///
/// Records how often each operation is called and can be switched into a
/// failing mode, which makes it the store of choice for exercising the engine.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    table: Mutex<TaskTable>,
    calls: Mutex<CallStats>,
    failing: Mutex<bool>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::with_tasks(Vec::new())
    }

    /// Creates a store holding `tasks`.
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        Self::named("memory", tasks)
    }

    /// Creates a store with a name used in error messages.
    pub fn named(name: impl Into<String>, tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            table: Mutex::new(TaskTable::new(name, tasks)),
            calls: Mutex::new(CallStats::default()),
            failing: Mutex::new(false),
        }
    }

    /// Applies an ambient context filter to every read.
    pub fn with_context(self, context: Filter) -> Self {
        self.table.lock().set_context(Some(context));
        self
    }

    /// Returns true while an ambient context filter is applied.
    pub fn has_context(&self) -> bool {
        self.table.lock().context().is_some()
    }

    /// Makes every read fail until switched off again.
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    /// Returns the call counters.
    pub fn calls(&self) -> CallStats {
        *self.calls.lock()
    }

    /// Resets the call counters.
    pub fn reset_calls(&self) {
        *self.calls.lock() = CallStats::default();
    }

    /// Returns a snapshot of all stored tasks.
    pub fn tasks(&self) -> Vec<Task> {
        self.table.lock().tasks().cloned().collect()
    }

    fn check_available(&self) -> Result<(), SyncError> {
        if *self.failing.lock() {
            return Err(SyncError::store_read(
                self.table.lock().name(),
                "connection unavailable",
            ));
        }
        Ok(())
    }
}

impl TaskStore for InMemoryStore {
    fn fetch(&self, uuid: &str) -> Result<Task, SyncError> {
        self.calls.lock().fetch += 1;
        self.check_available()?;
        self.table.lock().fetch(uuid)
    }

    fn filter(&self, uuids: &BTreeSet<String>) -> Result<Vec<Task>, SyncError> {
        self.calls.lock().filter += 1;
        self.check_available()?;
        Ok(self.table.lock().filter(uuids))
    }

    fn query(&self, filter: &Filter) -> Result<Vec<Task>, SyncError> {
        self.calls.lock().query += 1;
        self.check_available()?;
        Ok(self.table.lock().query(filter))
    }

    fn save(&self, task: Task) -> Result<Task, SyncError> {
        self.calls.lock().save += 1;
        self.table.lock().save(task)
    }

    fn disable_context(&self) {
        self.table.lock().set_context(None);
    }
}
