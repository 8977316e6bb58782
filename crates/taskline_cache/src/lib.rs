//! # taskline_cache
//!
//! Memoizing caches for Taskline.
//!
//! A [`MemoStore`] remembers three outcomes per key: a value, a resolved
//! "nothing here", or nothing at all. Cache kinds differ only in the
//! [`Resolver`] they hand to [`MemoStore::get_or_resolve`].

pub mod entry;
mod line;
mod store;

pub use entry::Lookup;
pub use line::{LineCache, LineKey, hash_content};
pub use store::{MemoStore, Resolver};
