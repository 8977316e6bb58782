//! Synchronization error types.

use thiserror::Error;

use taskline_parser::ParseError;

/// Errors that can occur while synchronizing a document with task stores.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration error, including references to unconfigured stores.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A task is not present in the store.
    #[error("Task '{uuid}' not found in store '{store}'")]
    NotFound {
        /// Store name.
        store: String,
        /// Task uuid.
        uuid: String,
    },

    /// Save order cannot make progress.
    #[error("Dependency cycle between tasks on lines {lines:?}")]
    DependencyCycle {
        /// Lines still waiting for their dependencies.
        lines: Vec<usize>,
    },

    /// The store rejected a write.
    #[error("Store '{store}' rejected write: {message}")]
    StoreWrite {
        /// Store name.
        store: String,
        /// Rejection reason.
        message: String,
    },

    /// The store could not be read.
    #[error("Store '{store}' read failed: {message}")]
    StoreRead {
        /// Store name.
        store: String,
        /// Failure reason.
        message: String,
    },

    /// A line position outside the document.
    #[error("Position {position} out of range for document of {len} lines")]
    Position {
        /// Requested position.
        position: usize,
        /// Document length at the time of the request.
        len: usize,
    },

    /// A line could not be parsed.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SyncError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a not-found error.
    pub fn not_found(store: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self::NotFound {
            store: store.into(),
            uuid: uuid.into(),
        }
    }

    /// Creates a store write error.
    pub fn store_write(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreWrite {
            store: store.into(),
            message: message.into(),
        }
    }

    /// Creates a store read error.
    pub fn store_read(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreRead {
            store: store.into(),
            message: message.into(),
        }
    }

    /// Creates a position error.
    pub fn position(position: usize, len: usize) -> Self {
        Self::Position { position, len }
    }
}
