//! Cache entry types.

/// Outcome of looking a key up in a [`MemoStore`](crate::MemoStore).
///
/// Distinguishes a key that was resolved to nothing from a key that was
/// never resolved at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<V> {
    /// The key was resolved to a value.
    Present(V),
    /// The key was resolved and there is nothing to cache for it.
    KnownAbsent,
    /// The key has not been resolved yet.
    Uncomputed,
}

impl<V> Lookup<V> {
    /// Returns true if a value is cached.
    pub fn is_present(&self) -> bool {
        matches!(self, Lookup::Present(_))
    }

    /// Returns true if the key was never resolved.
    pub fn is_uncomputed(&self) -> bool {
        matches!(self, Lookup::Uncomputed)
    }

    /// Returns the cached value, collapsing both empty outcomes into `None`.
    pub fn present(self) -> Option<V> {
        match self {
            Lookup::Present(value) => Some(value),
            Lookup::KnownAbsent | Lookup::Uncomputed => None,
        }
    }

    /// Maps the cached value, keeping the empty outcomes as they are.
    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> Lookup<U> {
        match self {
            Lookup::Present(value) => Lookup::Present(f(value)),
            Lookup::KnownAbsent => Lookup::KnownAbsent,
            Lookup::Uncomputed => Lookup::Uncomputed,
        }
    }
}

/// A stored slot. Absence of a slot means "uncomputed".
#[derive(Debug, Clone)]
pub(crate) enum Slot<V> {
    Value(V),
    Absent,
}

impl<V> Slot<V> {
    pub(crate) fn from_option(value: Option<V>) -> Self {
        match value {
            Some(value) => Slot::Value(value),
            None => Slot::Absent,
        }
    }

    pub(crate) fn as_lookup(&self) -> Lookup<&V> {
        match self {
            Slot::Value(value) => Lookup::Present(value),
            Slot::Absent => Lookup::KnownAbsent,
        }
    }

    pub(crate) fn into_lookup(self) -> Lookup<V> {
        match self {
            Slot::Value(value) => Lookup::Present(value),
            Slot::Absent => Lookup::KnownAbsent,
        }
    }

    pub(crate) fn value(&self) -> Option<&V> {
        match self {
            Slot::Value(value) => Some(value),
            Slot::Absent => None,
        }
    }
}
