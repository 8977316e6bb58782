//! The editable line sequence being synchronized.

use taskline_cache::{LineCache, LineKey};
use taskline_parser::{LineParser, ParsedLine};

use crate::SyncError;

/// An ordered, mutable sequence of text lines, indexed from 0 without gaps.
///
/// Callers validate positions before mutating; implementations may panic on
/// out-of-range indices passed to the mutating methods.
pub trait Document {
    /// Number of lines.
    fn line_count(&self) -> usize;

    /// Returns the line at `index`, or `None` past the end.
    fn line(&self, index: usize) -> Option<&str>;

    /// Replaces the line at `index`.
    fn set_line(&mut self, index: usize, text: String);

    /// Inserts a line so that it ends up at `index`.
    fn insert_line(&mut self, index: usize, text: String);

    /// Deletes the line at `index`, returning its text.
    fn delete_line(&mut self, index: usize) -> String;
}

/// In-memory document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<String>,
    trailing_newline: bool,
    /// Lines are joined with `\r\n` instead of `\n`.
    crlf: bool,
}

impl LineBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a buffer from individual lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            trailing_newline: false,
            crlf: false,
        }
    }

    /// Splits text into lines, remembering the line ending of the first
    /// line and whether the text ended with a newline.
    pub fn from_text(text: &str) -> Self {
        let crlf = text
            .find('\n')
            .is_some_and(|end| text[..end].ends_with('\r'));
        Self {
            lines: text.lines().map(str::to_string).collect(),
            trailing_newline: text.ends_with('\n'),
            crlf,
        }
    }

    fn line_ending(&self) -> &'static str {
        if self.crlf { "\r\n" } else { "\n" }
    }

    /// Joins the lines back into text.
    pub fn to_text(&self) -> String {
        let ending = self.line_ending();
        let mut text = self.lines.join(ending);
        if self.trailing_newline && !self.lines.is_empty() {
            text.push_str(ending);
        }
        text
    }

    /// Returns all lines.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl Document for LineBuffer {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    fn set_line(&mut self, index: usize, text: String) {
        self.lines[index] = text;
    }

    fn insert_line(&mut self, index: usize, text: String) {
        self.lines.insert(index, text);
    }

    fn delete_line(&mut self, index: usize) -> String {
        self.lines.remove(index)
    }
}

/// Classifies the line at `position`, memoized by parser and line content.
pub(crate) fn parse_line(
    document: &dyn Document,
    parser: &dyn LineParser,
    cache: &mut LineCache<ParsedLine>,
    position: usize,
) -> Result<ParsedLine, SyncError> {
    let text = document
        .line(position)
        .ok_or_else(|| SyncError::position(position, document.line_count()))?;

    let mut classify = |_: &LineKey| parser.classify(text).map(Some);
    let parsed = cache.get_or_resolve(LineKey::new(parser.name(), text), &mut classify)?;

    match parsed {
        Some(parsed) => Ok(parsed.clone()),
        // Only reachable if a known-absent marker was planted for this key.
        None => Ok(parser.classify(text)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use taskline_parser::WikiLineParser;

    #[test]
    fn test_text_roundtrip_keeps_trailing_newline() {
        let buffer = LineBuffer::from_text("a\nb\n");
        assert_eq!(buffer.line_count(), 2);
        assert_eq!(buffer.to_text(), "a\nb\n");

        let buffer = LineBuffer::from_text("a\nb");
        assert_eq!(buffer.to_text(), "a\nb");
    }

    #[test]
    fn test_text_roundtrip_keeps_crlf() {
        let text = "- [ ] a #uuid:1\r\n- [ ] b\r\n";
        let mut buffer = LineBuffer::from_text(text);
        assert_eq!(buffer.lines(), &["- [ ] a #uuid:1", "- [ ] b"]);
        assert_eq!(buffer.to_text(), text);

        buffer.insert_line(2, "- [ ] c".to_string());
        assert_eq!(buffer.to_text(), "- [ ] a #uuid:1\r\n- [ ] b\r\n- [ ] c\r\n");
    }

    #[test]
    fn test_empty_text() {
        let buffer = LineBuffer::from_text("");
        assert_eq!(buffer.line_count(), 0);
        assert_eq!(buffer.to_text(), "");
    }

    #[test]
    fn test_mutations() {
        let mut buffer = LineBuffer::from_lines(["a", "c"]);
        buffer.insert_line(1, "b".to_string());
        buffer.insert_line(3, "d".to_string());
        assert_eq!(buffer.lines(), &["a", "b", "c", "d"]);

        buffer.set_line(0, "A".to_string());
        assert_eq!(buffer.delete_line(3), "d");
        assert_eq!(buffer.lines(), &["A", "b", "c"]);
        assert_eq!(buffer.line(3), None);
    }

    #[test]
    fn test_parse_line_memoizes() {
        let buffer = LineBuffer::from_lines(["- [ ] a", "- [ ] a", "plain"]);
        let parser = WikiLineParser::new();
        let mut cache = LineCache::new();

        let first = parse_line(&buffer, &parser, &mut cache, 0).unwrap();
        let second = parse_line(&buffer, &parser, &mut cache, 1).unwrap();
        parse_line(&buffer, &parser, &mut cache, 2).unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_parse_line_out_of_range() {
        let buffer = LineBuffer::from_lines(["x"]);
        let mut cache = LineCache::new();
        let result = parse_line(&buffer, &WikiLineParser::new(), &mut cache, 5);
        assert!(matches!(
            result,
            Err(SyncError::Position {
                position: 5,
                len: 1
            })
        ));
    }
}
