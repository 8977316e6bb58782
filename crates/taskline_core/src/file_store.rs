//! Task store persisted as a JSON file.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use taskline_parser::Filter;
use tracing::{debug, info};

use crate::config::{CONTEXT_KEY, StoreConfig};
use crate::store::{TaskStore, TaskTable};
use crate::{SyncError, Task};

/// File holding the tasks inside a store's data directory.
pub const TASKS_FILE: &str = "tasks.json";

/// A task store backed by `<data_location>/tasks.json`.
///
/// The taskrc is read as `key=value` lines; only `context` has an effect,
/// restricting every read to tasks matching it. Configured overrides win over
/// taskrc values.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    table: Mutex<TaskTable>,
}

impl FileStore {
    /// Opens the store described by `config`. A missing tasks file is an empty store.
    pub fn open(name: &str, config: &StoreConfig) -> Result<Self, SyncError> {
        let path = config.data_path().join(TASKS_FILE);
        let tasks = load_tasks(&path)?;
        debug!("Loaded {} tasks from {}", tasks.len(), path.display());

        let mut settings = read_taskrc(&config.taskrc_path())?;
        settings.extend(config.overrides.clone());

        let mut table = TaskTable::new(name, tasks);
        if let Some(context) = settings.get(CONTEXT_KEY).filter(|c| !c.trim().is_empty()) {
            table.set_context(Some(Filter::parse(context)?));
        }

        Ok(Self {
            path,
            table: Mutex::new(table),
        })
    }

    /// Location of the tasks file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true while an ambient context filter is applied.
    pub fn has_context(&self) -> bool {
        self.table.lock().context().is_some()
    }

    fn persist(&self, table: &TaskTable) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tasks: Vec<&Task> = table.tasks().collect();
        let json = serde_json::to_string_pretty(&tasks)
            .map_err(|e| SyncError::Serialization(e.to_string()))?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl TaskStore for FileStore {
    fn fetch(&self, uuid: &str) -> Result<Task, SyncError> {
        self.table.lock().fetch(uuid)
    }

    fn filter(&self, uuids: &BTreeSet<String>) -> Result<Vec<Task>, SyncError> {
        Ok(self.table.lock().filter(uuids))
    }

    fn query(&self, filter: &Filter) -> Result<Vec<Task>, SyncError> {
        Ok(self.table.lock().query(filter))
    }

    fn save(&self, task: Task) -> Result<Task, SyncError> {
        let mut table = self.table.lock();
        // The table only changes once the file is written.
        let mut staged = table.clone();
        let saved = staged.save(task)?;
        self.persist(&staged)?;
        *table = staged;
        info!("Saved task {} to {}", saved.uuid, self.path.display());
        Ok(saved)
    }

    fn disable_context(&self) {
        self.table.lock().set_context(None);
    }
}

fn load_tasks(path: &Path) -> Result<Vec<Task>, SyncError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&content)
        .map_err(|e| SyncError::Serialization(format!("{}: {}", path.display(), e)))
}

/// Reads `key=value` settings. Blank lines and `#` comments are skipped.
fn read_taskrc(path: &Path) -> Result<BTreeMap<String, String>, SyncError> {
    if !path.is_file() {
        return Ok(BTreeMap::new());
    }
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect())
}
