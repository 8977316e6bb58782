//! Wiki-style list parser.
//!
//! Task lines look like `- [ ] description pri:H dep:<id> @store #uuid:<id>`,
//! view lines like `== Name | filter @store ==`.

use crate::{Filter, LineParser, ParseError, Priority, Status, TaskLine, ViewSpec};

const UUID_PREFIX: &str = "#uuid:";
const DEP_PREFIX: &str = "dep:";
const PRIORITY_PREFIX: &str = "pri:";
const VIEW_MARKER: &str = "==";

/// Parser for wiki-style task lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct WikiLineParser;

impl WikiLineParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        Self
    }
}

impl LineParser for WikiLineParser {
    fn name(&self) -> &str {
        "wiki"
    }

    fn parse_task(&self, line: &str) -> Option<TaskLine> {
        let body = line.trim_start();
        let indent = &line[..line.len() - body.len()];

        let mut chars = body.chars();
        let bullet = chars.next().filter(|c| matches!(c, '-' | '*'))?;
        let rest = chars.as_str().strip_prefix(' ')?.trim_start();

        let (checkbox, rest) = split_checkbox(rest);

        let mut task = TaskLine::new(String::new());
        task.indent = indent.to_string();
        task.bullet = bullet;
        task.status = checkbox.unwrap_or_default();

        let mut words = Vec::new();
        for token in rest.split_whitespace() {
            if let Some(uuid) = token.strip_prefix(UUID_PREFIX).filter(|s| !s.is_empty()) {
                task.uuid = Some(uuid.to_string());
            } else if let Some(source) = token.strip_prefix('@').filter(|s| !s.is_empty()) {
                task.source = Some(source.to_string());
            } else if let Some(deps) = token.strip_prefix(DEP_PREFIX).filter(|s| !s.is_empty()) {
                task.depends.extend(
                    deps.split(',')
                        .filter(|d| !d.is_empty())
                        .map(str::to_string),
                );
            } else if let Some(priority) = token
                .strip_prefix(PRIORITY_PREFIX)
                .and_then(|p| p.parse::<Priority>().ok())
            {
                task.priority = Some(priority);
            } else {
                words.push(token);
            }
        }

        if checkbox.is_none() && task.uuid.is_none() {
            return None;
        }

        task.description = words.join(" ");
        Some(task)
    }

    fn parse_view(&self, line: &str) -> Result<Option<ViewSpec>, ParseError> {
        let trimmed = line.trim();
        let inner = match trimmed
            .strip_prefix(VIEW_MARKER)
            .and_then(|s| s.strip_suffix(VIEW_MARKER))
        {
            Some(inner) if trimmed.len() >= 2 * VIEW_MARKER.len() => inner.trim(),
            _ => return Ok(None),
        };

        let (name, expression) = match inner.split_once('|') {
            Some((name, expression)) => (name.trim(), expression),
            None => (inner, ""),
        };
        if name.is_empty() {
            return Ok(None);
        }

        let mut source = None;
        let mut terms = Vec::new();
        for token in expression.split_whitespace() {
            match token.strip_prefix('@').filter(|s| !s.is_empty()) {
                Some(store) => source = Some(store.to_string()),
                None => terms.push(token),
            }
        }

        Ok(Some(ViewSpec {
            name: name.to_string(),
            filter: Filter::parse(&terms.join(" "))?,
            source,
        }))
    }
}

/// Splits a leading `[m]` checkbox off the body.
fn split_checkbox(body: &str) -> (Option<Status>, &str) {
    let mut chars = body.chars();
    if chars.next() != Some('[') {
        return (None, body);
    }
    let status = match chars.next().and_then(Status::from_mark) {
        Some(status) => status,
        None => return (None, body),
    };
    if chars.next() != Some(']') {
        return (None, body);
    }
    (Some(status), chars.as_str())
}
