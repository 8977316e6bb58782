//! Task records and identities.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use taskline_parser::{Filter, FilterTerm, Priority, Status};

/// A task as held by an external store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique id within the store. Empty for tasks the store has not seen yet.
    #[serde(default)]
    pub uuid: String,

    pub description: String,

    #[serde(default)]
    pub status: Status,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,

    /// Uuids of tasks that must exist before this one.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub depends: BTreeSet<String>,
}

impl Task {
    /// Creates a pending task with no uuid.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            uuid: String::new(),
            description: description.into(),
            status: Status::Pending,
            priority: None,
            project: None,
            tags: BTreeSet::new(),
            depends: BTreeSet::new(),
        }
    }

    /// Sets the uuid.
    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = uuid.into();
        self
    }

    /// Returns true if the task has not been saved to a store yet.
    pub fn is_new(&self) -> bool {
        self.uuid.is_empty()
    }

    /// Returns true if the task satisfies every term of `filter`.
    pub fn matches(&self, filter: &Filter) -> bool {
        filter.terms().iter().all(|term| match term {
            FilterTerm::Status(status) => self.status == *status,
            FilterTerm::Priority(priority) => self.priority == Some(*priority),
            FilterTerm::Project(project) => self.project.as_deref() == Some(project.as_str()),
            FilterTerm::Tag(tag) => self.tags.contains(tag),
            FilterTerm::NoTag(tag) => !self.tags.contains(tag),
            FilterTerm::Word(word) => self
                .description
                .to_lowercase()
                .contains(&word.to_lowercase()),
        })
    }
}

/// Names one task: a store connection plus the task's uuid in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    pub store: String,
    pub uuid: String,
}

impl Identity {
    /// Creates an identity.
    pub fn new(store: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            uuid: uuid.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.store, self.uuid)
    }
}

/// Which side wins when the document and the store disagree about a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Authority {
    /// The document line wins.
    #[default]
    Buffer,
    /// The store snapshot wins.
    Store,
}
