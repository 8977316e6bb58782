//! # taskline_core
//!
//! Keeps a line-oriented task document in sync with external task stores.
//!
//! This crate provides:
//! - The `SyncEngine` orchestrator and its position-keyed caches
//! - Store connectors (`InMemoryStore`, `FileStore`) and the `StoreRegistry`
//! - Dependency-respecting save ordering
//! - Configuration loading
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use taskline_core::{Authority, InMemoryStore, LineBuffer, StoreRegistry, SyncEngine, Task};
//!
//! let store = Arc::new(InMemoryStore::named("default", [Task::new("task A").with_uuid("111")]));
//! let document = LineBuffer::from_lines(["- [ ] task A #uuid:111", "- [ ] task B dep:111"]);
//! let mut engine = SyncEngine::new(document, StoreRegistry::new(store));
//!
//! engine.batch_load_identities()?;
//! engine.load_wrappers(Authority::Buffer)?;
//! assert_eq!(engine.save_in_dependency_order()?, vec![0, 1]);
//! # Ok::<(), taskline_core::SyncError>(())
//! ```

mod config;
mod document;
mod edit;
mod engine;
mod error;
mod file_store;
mod identity;
mod memory_store;
mod order;
mod registry;
mod store;
mod task;
mod viewport;
mod wrapper;

pub use config::{
    CONFIG_FILES, CONTEXT_KEY, DEFAULT_DATA_LOCATION, DEFAULT_TASKRC_LOCATION, StoreConfig,
    StoreOverride, SyncConfig,
};
pub use document::{Document, LineBuffer};
pub use engine::{SyncEngine, ViewportChanges};
pub use error::SyncError;
pub use file_store::{FileStore, TASKS_FILE};
pub use identity::IdentityCache;
pub use memory_store::{CallStats, InMemoryStore};
pub use order::DependencyGraph;
pub use registry::{Connector, DEFAULT_STORE, FileConnector, StoreConnection, StoreRegistry};
pub use store::TaskStore;
pub use task::{Authority, Identity, Task};
pub use viewport::ViewPort;
pub use wrapper::TaskWrapper;
