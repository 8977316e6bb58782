//! Parse error types.

use thiserror::Error;

/// Errors that can occur while parsing a line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A filter term could not be understood.
    #[error("Invalid filter term '{term}': {message}")]
    InvalidTerm {
        /// The offending term.
        term: String,
        /// Error message.
        message: String,
    },

    /// Unknown priority value.
    #[error("Invalid priority: {0}")]
    InvalidPriority(String),

    /// Unknown status value.
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
}

impl ParseError {
    /// Creates a new invalid term error.
    pub fn invalid_term(term: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTerm {
            term: term.into(),
            message: message.into(),
        }
    }
}
