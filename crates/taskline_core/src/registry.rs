//! Named store connections.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::{StoreConfig, SyncConfig};
use crate::file_store::FileStore;
use crate::store::TaskStore;
use crate::SyncError;

/// Name of the store used by lines without an explicit `@store`.
pub const DEFAULT_STORE: &str = "default";

/// Opens store connections from their configuration.
pub trait Connector {
    /// Connects to the store `name`.
    fn connect(&self, name: &str, config: &StoreConfig) -> Result<Arc<dyn TaskStore>, SyncError>;
}

/// Connects to [`FileStore`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileConnector;

impl Connector for FileConnector {
    fn connect(&self, name: &str, config: &StoreConfig) -> Result<Arc<dyn TaskStore>, SyncError> {
        Ok(Arc::new(FileStore::open(name, config)?))
    }
}

/// A live connection to one named store.
#[derive(Clone)]
pub struct StoreConnection {
    name: String,
    config: StoreConfig,
    handle: Arc<dyn TaskStore>,
}

impl StoreConnection {
    /// Wraps a handle. The store's ambient context is switched off.
    pub fn new(name: impl Into<String>, config: StoreConfig, handle: Arc<dyn TaskStore>) -> Self {
        handle.disable_context();
        Self {
            name: name.into(),
            config: config.without_context(),
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn handle(&self) -> &dyn TaskStore {
        self.handle.as_ref()
    }
}

impl fmt::Debug for StoreConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConnection")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// The default connection plus any number of named ones.
#[derive(Debug, Clone)]
pub struct StoreRegistry {
    default: StoreConnection,
    extra: BTreeMap<String, StoreConnection>,
}

impl StoreRegistry {
    /// Creates a registry holding only the default store.
    pub fn new(default: Arc<dyn TaskStore>) -> Self {
        Self {
            default: StoreConnection::new(DEFAULT_STORE, StoreConfig::default(), default),
            extra: BTreeMap::new(),
        }
    }

    /// Connects every store named in `config`.
    pub fn from_config(config: &SyncConfig, connector: &dyn Connector) -> Result<Self, SyncError> {
        let default_config = config.default_store();
        let default = connector.connect(DEFAULT_STORE, &default_config)?;
        let mut registry = Self {
            default: StoreConnection::new(DEFAULT_STORE, default_config, default),
            extra: BTreeMap::new(),
        };

        for (name, store_config) in config.extra_store_configs() {
            if name == DEFAULT_STORE {
                return Err(SyncError::config(format!(
                    "extra store may not be named '{}'",
                    DEFAULT_STORE
                )));
            }
            let handle = connector.connect(&name, &store_config)?;
            registry.insert(StoreConnection::new(name, store_config, handle));
        }

        debug!("Connected {} store(s)", registry.len());
        Ok(registry)
    }

    /// Adds a named store.
    pub fn with_store(mut self, name: impl Into<String>, handle: Arc<dyn TaskStore>) -> Self {
        self.insert(StoreConnection::new(name, StoreConfig::default(), handle));
        self
    }

    /// Adds or replaces a named connection.
    pub fn insert(&mut self, connection: StoreConnection) {
        if connection.name() == DEFAULT_STORE {
            self.default = connection;
        } else {
            self.extra.insert(connection.name().to_string(), connection);
        }
    }

    /// Resolves a store name.
    pub fn resolve(&self, name: &str) -> Result<&StoreConnection, SyncError> {
        if name == DEFAULT_STORE {
            return Ok(&self.default);
        }
        self.extra
            .get(name)
            .ok_or_else(|| SyncError::config(format!("store '{}' is not configured", name)))
    }

    /// Resolves an optional `@store` reference, defaulting to the default store.
    pub fn resolve_source(&self, source: Option<&str>) -> Result<&StoreConnection, SyncError> {
        self.resolve(source.unwrap_or(DEFAULT_STORE))
    }

    pub fn default_connection(&self) -> &StoreConnection {
        &self.default
    }

    /// Iterates over every connection, the default one first.
    pub fn values(&self) -> impl Iterator<Item = &StoreConnection> {
        std::iter::once(&self.default).chain(self.extra.values())
    }

    /// Number of connections, the default one included.
    pub fn len(&self) -> usize {
        1 + self.extra.len()
    }

    /// Always false: the default connection is always present.
    pub fn is_empty(&self) -> bool {
        false
    }
}
