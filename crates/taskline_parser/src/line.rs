//! Parsed line representations.

use std::fmt::Write as _;

use crate::{Filter, Priority, Status};

/// A line that encodes a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLine {
    /// Leading whitespace, kept verbatim for rendering.
    pub indent: String,
    /// List bullet (`-` or `*`).
    pub bullet: char,
    pub status: Status,
    pub description: String,
    /// Identity reference (`#uuid:<id>`), absent for tasks not yet saved.
    pub uuid: Option<String>,
    /// Explicit store name (`@<store>`); `None` means the default store.
    pub source: Option<String>,
    pub priority: Option<Priority>,
    /// Explicit dependencies (`dep:<id>,<id>`), in line order.
    pub depends: Vec<String>,
}

impl TaskLine {
    /// Creates a pending task line with the default bullet and no indent.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            indent: String::new(),
            bullet: '-',
            status: Status::Pending,
            description: description.into(),
            uuid: None,
            source: None,
            priority: None,
            depends: Vec::new(),
        }
    }

    /// Visual indentation width; tabs count as 4 columns.
    pub fn depth(&self) -> usize {
        indent_width(&self.indent)
    }

    /// Renders the line in canonical form.
    pub fn render(&self) -> String {
        let mut out = format!("{}{} [{}]", self.indent, self.bullet, self.status.mark());
        if !self.description.is_empty() {
            let _ = write!(out, " {}", self.description);
        }
        if let Some(priority) = self.priority {
            let _ = write!(out, " pri:{}", priority);
        }
        if !self.depends.is_empty() {
            let _ = write!(out, " dep:{}", self.depends.join(","));
        }
        if let Some(source) = &self.source {
            let _ = write!(out, " @{}", source);
        }
        if let Some(uuid) = &self.uuid {
            let _ = write!(out, " #uuid:{}", uuid);
        }
        out
    }
}

/// A line that defines a view over the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSpec {
    pub name: String,
    pub filter: Filter,
    /// Explicit store name; `None` means the default store.
    pub source: Option<String>,
}

/// Classification of a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    Task(TaskLine),
    View(ViewSpec),
    Plain {
        /// Visual indentation width of the line.
        depth: usize,
        /// Whether the line is empty or whitespace only.
        blank: bool,
    },
}

impl ParsedLine {
    /// Returns the task line, if this is one.
    pub fn as_task(&self) -> Option<&TaskLine> {
        match self {
            ParsedLine::Task(task) => Some(task),
            _ => None,
        }
    }

    /// Returns the view spec, if this is one.
    pub fn as_view(&self) -> Option<&ViewSpec> {
        match self {
            ParsedLine::View(view) => Some(view),
            _ => None,
        }
    }

    /// Visual indentation width of the line.
    pub fn depth(&self) -> usize {
        match self {
            ParsedLine::Task(task) => task.depth(),
            ParsedLine::View(_) => 0,
            ParsedLine::Plain { depth, .. } => *depth,
        }
    }

    /// Returns true for empty or whitespace-only lines.
    pub fn is_blank(&self) -> bool {
        matches!(self, ParsedLine::Plain { blank: true, .. })
    }
}

/// Visual width of leading whitespace; tabs advance to the next multiple of 4.
pub fn indent_width(text: &str) -> usize {
    text.chars()
        .take_while(|c| c.is_whitespace())
        .fold(0, |acc, c| if c == '\t' { (acc + 4) / 4 * 4 } else { acc + 1 })
}
