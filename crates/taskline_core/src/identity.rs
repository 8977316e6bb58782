//! Task snapshots keyed by external identity.

use taskline_cache::{Lookup, MemoStore};

use crate::{Identity, Task};

/// Last-fetched task snapshots, keyed by `(store, uuid)`.
///
/// The cache never reaches out to a store on a miss: it is populated in bulk
/// by the engine, and an unpopulated identity reads as "no such task".
#[derive(Debug, Default)]
pub struct IdentityCache {
    tasks: MemoStore<Identity, Task>,
}

impl IdentityCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the snapshot for `identity`, if one was loaded.
    pub fn get(&self, identity: &Identity) -> Option<&Task> {
        self.tasks.get(identity)
    }

    /// Returns the cached outcome for `identity` without interpreting it.
    pub fn lookup(&self, identity: &Identity) -> Lookup<&Task> {
        self.tasks.lookup(identity)
    }

    /// Stores a snapshot. `None` evicts the identity.
    pub fn set(&mut self, identity: Identity, task: Option<Task>) {
        self.tasks.set(identity, task);
    }

    /// Clears every snapshot.
    pub fn reset(&mut self) {
        self.tasks.reset();
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if no snapshot is stored.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterates over stored identities and their snapshots.
    pub fn iter(&self) -> impl Iterator<Item = (&Identity, &Task)> {
        self.tasks.iter()
    }
}
