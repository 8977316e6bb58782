//! Line-content keyed caching.

use crate::MemoStore;

/// Cache key for a value parsed out of a single line of text.
///
/// Keyed by the parser that produced the value and a BLAKE3 hash of the raw
/// line, so the cache does not hold on to line text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    parser: String,
    content: blake3::Hash,
}

impl LineKey {
    /// Creates a key for `line` as parsed by `parser`.
    pub fn new(parser: impl Into<String>, line: &str) -> Self {
        Self {
            parser: parser.into(),
            content: hash_content(line),
        }
    }

    /// Name of the parser this key belongs to.
    pub fn parser(&self) -> &str {
        &self.parser
    }
}

/// Computes the BLAKE3 hash of content.
pub fn hash_content(content: &str) -> blake3::Hash {
    blake3::hash(content.as_bytes())
}

/// Memoization of parsed line values.
pub type LineCache<V> = MemoStore<LineKey, V>;
