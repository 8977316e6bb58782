//! # taskline_parser
//!
//! Line parsing for Taskline documents.
//!
//! This crate provides:
//! - A `LineParser` trait deciding whether a line is a task, a view, or plain text
//! - The built-in wiki-style list parser
//! - Filter expressions shared by view lines and store queries
//!
//! Parsers are pure functions of a single line; they never look at
//! neighbouring lines or the task store.

mod error;
mod fields;
mod filter;
mod line;
mod traits;
mod wiki;

pub use error::ParseError;
pub use fields::{Priority, Status};
pub use filter::{Filter, FilterTerm};
pub use line::{ParsedLine, TaskLine, ViewSpec, indent_width};
pub use traits::LineParser;
pub use wiki::WikiLineParser;
