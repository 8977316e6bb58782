//! Filter expressions used by view lines and store queries.

use std::fmt;

use crate::{ParseError, Priority, Status};

/// A single filter condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterTerm {
    Status(Status),
    Priority(Priority),
    Project(String),
    /// `+tag`
    Tag(String),
    /// `-tag`
    NoTag(String),
    /// Bare word, matched against the description (case-insensitive).
    Word(String),
}

/// A conjunction of filter terms. The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    terms: Vec<FilterTerm>,
}

impl Filter {
    /// Creates a filter from terms.
    pub fn new(terms: Vec<FilterTerm>) -> Self {
        Self { terms }
    }

    /// Parses a whitespace-separated filter expression.
    pub fn parse(expression: &str) -> Result<Self, ParseError> {
        expression
            .split_whitespace()
            .map(parse_term)
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    /// Returns the terms of this filter.
    pub fn terms(&self) -> &[FilterTerm] {
        &self.terms
    }

    /// Returns true if the filter has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Returns a filter requiring both `self` and `other`.
    pub fn and(&self, other: &Filter) -> Filter {
        let mut terms = self.terms.clone();
        terms.extend(other.terms.iter().cloned());
        Filter::new(terms)
    }
}

fn parse_term(term: &str) -> Result<FilterTerm, ParseError> {
    if let Some(tag) = term.strip_prefix('+') {
        return non_empty(term, tag).map(FilterTerm::Tag);
    }
    if let Some(tag) = term.strip_prefix('-') {
        return non_empty(term, tag).map(FilterTerm::NoTag);
    }

    match term.split_once(':') {
        Some(("status", value)) => value
            .parse()
            .map(FilterTerm::Status)
            .map_err(|e| ParseError::invalid_term(term, e.to_string())),
        Some(("pri", value)) | Some(("priority", value)) => value
            .parse()
            .map(FilterTerm::Priority)
            .map_err(|e| ParseError::invalid_term(term, e.to_string())),
        Some(("project", value)) => non_empty(term, value).map(FilterTerm::Project),
        Some((key, _)) => Err(ParseError::invalid_term(
            term,
            format!("unknown attribute '{}'", key),
        )),
        None => Ok(FilterTerm::Word(term.to_string())),
    }
}

fn non_empty(term: &str, value: &str) -> Result<String, ParseError> {
    if value.is_empty() {
        Err(ParseError::invalid_term(term, "missing value"))
    } else {
        Ok(value.to_string())
    }
}

impl fmt::Display for FilterTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterTerm::Status(status) => write!(f, "status:{}", status),
            FilterTerm::Priority(priority) => write!(f, "pri:{}", priority),
            FilterTerm::Project(project) => write!(f, "project:{}", project),
            FilterTerm::Tag(tag) => write!(f, "+{}", tag),
            FilterTerm::NoTag(tag) => write!(f, "-{}", tag),
            FilterTerm::Word(word) => f.write_str(word),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", term)?;
        }
        Ok(())
    }
}
