//! Task field values shared by lines, filters and stores.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Completed,
    Deleted,
}

impl Status {
    /// Checkbox mark used when rendering a line.
    pub fn mark(self) -> char {
        match self {
            Status::Pending => ' ',
            Status::Completed => 'X',
            Status::Deleted => 'D',
        }
    }

    /// Parses a checkbox mark.
    pub fn from_mark(mark: char) -> Option<Self> {
        match mark {
            ' ' => Some(Status::Pending),
            'X' | 'x' => Some(Status::Completed),
            'D' => Some(Status::Deleted),
            _ => None,
        }
    }
}

impl FromStr for Status {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "completed" => Ok(Status::Completed),
            "deleted" => Ok(Status::Deleted),
            _ => Err(ParseError::InvalidStatus(s.to_string())),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Pending => "pending",
            Status::Completed => "completed",
            Status::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "H")]
    High,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Low,
}

impl FromStr for Priority {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "H" | "h" => Ok(Priority::High),
            "M" | "m" => Ok(Priority::Medium),
            "L" | "l" => Ok(Priority::Low),
            _ => Err(ParseError::InvalidPriority(s.to_string())),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Priority::High => "H",
            Priority::Medium => "M",
            Priority::Low => "L",
        };
        f.write_str(letter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(' ', Status::Pending)]
    #[case('X', Status::Completed)]
    #[case('x', Status::Completed)]
    #[case('D', Status::Deleted)]
    fn test_status_from_mark(#[case] mark: char, #[case] expected: Status) {
        assert_eq!(Status::from_mark(mark), Some(expected));
    }

    #[test]
    fn test_status_unknown_mark() {
        assert_eq!(Status::from_mark('?'), None);
    }

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!("Completed".parse::<Status>().unwrap(), Status::Completed);
        assert_eq!(Status::Deleted.to_string(), "deleted");
        assert!(matches!(
            "waiting".parse::<Status>(),
            Err(ParseError::InvalidStatus(_))
        ));
    }

    #[test]
    fn test_priority_serde_uses_letters() {
        let json = serde_json::to_string(&Priority::High).unwrap();
        assert_eq!(json, "\"H\"");
        let back: Priority = serde_json::from_str("\"L\"").unwrap();
        assert_eq!(back, Priority::Low);
    }

    #[test]
    fn test_priority_rejects_unknown() {
        assert_eq!(
            "X".parse::<Priority>(),
            Err(ParseError::InvalidPriority("X".to_string()))
        );
    }
}
