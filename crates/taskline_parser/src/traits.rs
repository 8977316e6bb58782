//! Parser trait definition.

use crate::{ParseError, ParsedLine, TaskLine, ViewSpec};

/// Trait for recognizing tasks and views in document lines.
///
/// Implementations must be pure: the same line always yields the same
/// result, which is what allows results to be cached by line content.
///
/// # Example
///
/// ```rust
/// use taskline_parser::{LineParser, ParsedLine, WikiLineParser};
///
/// let parser = WikiLineParser::new();
/// let parsed = parser.classify("- [ ] water plants #uuid:42").unwrap();
///
/// let task = parsed.as_task().unwrap();
/// assert_eq!(task.uuid.as_deref(), Some("42"));
/// assert_eq!(task.description, "water plants");
/// ```
pub trait LineParser {
    /// Returns the name of this parser. Used to key cached results.
    fn name(&self) -> &str;

    /// Parses a task line, or returns `None` if the line is not a task.
    fn parse_task(&self, line: &str) -> Option<TaskLine>;

    /// Parses a view line, or returns `None` if the line is not a view.
    ///
    /// A line that looks like a view but carries an invalid filter is an error.
    fn parse_view(&self, line: &str) -> Result<Option<ViewSpec>, ParseError>;

    /// Classifies a line. Views take precedence over tasks.
    fn classify(&self, line: &str) -> Result<ParsedLine, ParseError> {
        if let Some(view) = self.parse_view(line)? {
            return Ok(ParsedLine::View(view));
        }
        if let Some(task) = self.parse_task(line) {
            return Ok(ParsedLine::Task(task));
        }
        Ok(ParsedLine::Plain {
            depth: crate::line::indent_width(line),
            blank: line.trim().is_empty(),
        })
    }
}
