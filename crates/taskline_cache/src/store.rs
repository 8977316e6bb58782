//! Generic memoizing map.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;

use tracing::trace;

use crate::entry::{Lookup, Slot};

/// Strategy used by a [`MemoStore`] to compute a value on a miss.
///
/// Returning `Ok(None)` records the key as known-absent, so the strategy is
/// not consulted again for it until the key is cleared.
pub trait Resolver<K, V> {
    /// Error produced when resolution fails. Failed resolutions are not cached.
    type Error;

    /// Computes the value for `key`.
    fn resolve(&mut self, key: &K) -> Result<Option<V>, Self::Error>;
}

impl<K, V, E, F> Resolver<K, V> for F
where
    F: FnMut(&K) -> Result<Option<V>, E>,
{
    type Error = E;

    fn resolve(&mut self, key: &K) -> Result<Option<V>, E> {
        self(key)
    }
}

/// A map that memoizes both values and "nothing here" outcomes.
///
/// Storing `None` through [`MemoStore::set`] deletes the key: a later lookup
/// reports [`Lookup::Uncomputed`], never a stored `None`. Known absence can
/// only be recorded by a resolver or [`MemoStore::mark_absent`].
#[derive(Debug, Clone)]
pub struct MemoStore<K, V> {
    entries: HashMap<K, Slot<V>>,
}

impl<K: Eq + Hash, V> MemoStore<K, V> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Looks up a key without resolving it.
    pub fn lookup(&self, key: &K) -> Lookup<&V> {
        match self.entries.get(key) {
            Some(slot) => slot.as_lookup(),
            None => Lookup::Uncomputed,
        }
    }

    /// Returns the cached value for a key, if any.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).and_then(Slot::value)
    }

    /// Returns a mutable reference to the cached value for a key, if any.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        match self.entries.get_mut(key) {
            Some(Slot::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns the cached value, resolving and memoizing it on a miss.
    pub fn get_or_resolve<R>(&mut self, key: K, resolver: &mut R) -> Result<Option<&V>, R::Error>
    where
        R: Resolver<K, V>,
    {
        let slot = match self.entries.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                trace!("cache miss, resolving");
                let resolved = resolver.resolve(entry.key())?;
                entry.insert(Slot::from_option(resolved))
            }
        };
        Ok(slot.value())
    }

    /// Stores a value. `None` removes the key entirely.
    pub fn set(&mut self, key: K, value: Option<V>) {
        match value {
            Some(value) => {
                self.entries.insert(key, Slot::Value(value));
            }
            None => {
                self.entries.remove(&key);
            }
        }
    }

    /// Records that the key resolves to nothing.
    pub fn mark_absent(&mut self, key: K) {
        self.entries.insert(key, Slot::Absent);
    }

    /// Removes a key, returning what was stored under it.
    pub fn take(&mut self, key: &K) -> Lookup<V> {
        match self.entries.remove(key) {
            Some(slot) => slot.into_lookup(),
            None => Lookup::Uncomputed,
        }
    }

    /// Puts back an outcome previously obtained from [`MemoStore::take`].
    pub fn restore(&mut self, key: K, lookup: Lookup<V>) {
        match lookup {
            Lookup::Present(value) => {
                self.entries.insert(key, Slot::Value(value));
            }
            Lookup::KnownAbsent => {
                self.entries.insert(key, Slot::Absent);
            }
            Lookup::Uncomputed => {
                self.entries.remove(&key);
            }
        }
    }

    /// Exchanges whatever is stored under two keys, including the empty outcomes.
    pub fn swap(&mut self, first: K, second: K) {
        let first_outcome = self.take(&first);
        let second_outcome = self.take(&second);
        self.restore(first, second_outcome);
        self.restore(second, first_outcome);
    }

    /// Re-keys every cached value from the value itself.
    ///
    /// Known-absent markers are dropped, since they carry no key of their own.
    pub fn rekey(&mut self, key_of: impl Fn(&V) -> K) {
        let entries = std::mem::take(&mut self.entries);
        self.entries = entries
            .into_values()
            .filter_map(|slot| match slot {
                Slot::Value(value) => Some((key_of(&value), Slot::Value(value))),
                Slot::Absent => None,
            })
            .collect();
    }

    /// Clears all entries.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Iterates over cached values.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values().filter_map(Slot::value)
    }

    /// Iterates mutably over cached values.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.values_mut().filter_map(|slot| match slot {
            Slot::Value(value) => Some(value),
            Slot::Absent => None,
        })
    }

    /// Iterates over keys with cached values.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries
            .iter()
            .filter_map(|(key, slot)| slot.value().map(|value| (key, value)))
    }

    /// Returns the number of cached values.
    pub fn len(&self) -> usize {
        self.values().count()
    }

    /// Returns true if no value is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of resolved keys, known-absent ones included.
    pub fn resolved_len(&self) -> usize {
        self.entries.len()
    }
}

impl<K: Eq + Hash, V> Default for MemoStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::convert::Infallible;

    struct Counting {
        calls: usize,
    }

    impl Resolver<u32, String> for Counting {
        type Error = Infallible;

        fn resolve(&mut self, key: &u32) -> Result<Option<String>, Infallible> {
            self.calls += 1;
            Ok((key % 2 == 0).then(|| format!("even-{}", key)))
        }
    }

    #[test]
    fn test_memo_store_new() {
        let store: MemoStore<u32, String> = MemoStore::new();
        assert!(store.is_empty());
        assert_eq!(store.resolved_len(), 0);
    }

    #[test]
    fn test_resolves_once_per_key() {
        let mut store = MemoStore::new();
        let mut resolver = Counting { calls: 0 };

        let first = store.get_or_resolve(2, &mut resolver).unwrap().cloned();
        let second = store.get_or_resolve(2, &mut resolver).unwrap().cloned();

        assert_eq!(first.as_deref(), Some("even-2"));
        assert_eq!(first, second);
        assert_eq!(resolver.calls, 1);
    }

    #[test]
    fn test_absent_outcome_is_memoized() {
        let mut store = MemoStore::new();
        let mut resolver = Counting { calls: 0 };

        assert!(store.get_or_resolve(3, &mut resolver).unwrap().is_none());
        assert!(store.get_or_resolve(3, &mut resolver).unwrap().is_none());

        assert_eq!(resolver.calls, 1);
        assert_eq!(store.lookup(&3), Lookup::KnownAbsent);
        assert!(store.is_empty());
        assert_eq!(store.resolved_len(), 1);
    }

    #[test]
    fn test_failed_resolution_is_not_cached() {
        let mut store: MemoStore<u32, String> = MemoStore::new();
        let mut failing = |_: &u32| -> Result<Option<String>, &'static str> { Err("boom") };

        assert_eq!(store.get_or_resolve(1, &mut failing), Err("boom"));
        assert_eq!(store.lookup(&1), Lookup::Uncomputed);
    }

    #[test]
    fn test_setting_none_deletes() {
        let mut store = MemoStore::new();
        store.set(1, Some("one".to_string()));
        assert_eq!(store.lookup(&1), Lookup::Present(&"one".to_string()));

        store.set(1, None);
        assert_eq!(store.lookup(&1), Lookup::Uncomputed);
    }

    #[test]
    fn test_setting_none_clears_known_absent() {
        let mut store: MemoStore<u32, String> = MemoStore::new();
        store.mark_absent(4);
        assert_eq!(store.lookup(&4), Lookup::KnownAbsent);

        store.set(4, None);
        assert_eq!(store.lookup(&4), Lookup::Uncomputed);
    }

    #[test]
    fn test_swap_exchanges_all_outcomes() {
        let mut store = MemoStore::new();
        store.set(0, Some("zero".to_string()));
        store.mark_absent(1);

        store.swap(0, 1);
        assert_eq!(store.lookup(&0), Lookup::KnownAbsent);
        assert_eq!(store.get(&1).map(String::as_str), Some("zero"));

        store.swap(1, 2);
        assert_eq!(store.lookup(&1), Lookup::Uncomputed);
        assert_eq!(store.get(&2).map(String::as_str), Some("zero"));
    }

    #[test]
    fn test_rekey_uses_value_and_drops_absent() {
        let mut store = MemoStore::new();
        store.set(0, Some(10u32));
        store.set(1, Some(11u32));
        store.mark_absent(2);

        store.rekey(|value| *value);

        assert_eq!(store.get(&10), Some(&10));
        assert_eq!(store.get(&11), Some(&11));
        assert_eq!(store.lookup(&2), Lookup::Uncomputed);
        assert_eq!(store.resolved_len(), 2);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut store = MemoStore::new();
        store.set(0, Some(1u8));
        store.mark_absent(1);

        store.reset();
        assert_eq!(store.resolved_len(), 0);
    }

    #[test]
    fn test_values_mut() {
        let mut store = MemoStore::new();
        store.set("a", Some(1));
        store.set("b", Some(2));
        store.mark_absent("c");

        for value in store.values_mut() {
            *value *= 10;
        }

        let mut values: Vec<_> = store.values().copied().collect();
        values.sort();
        assert_eq!(values, vec![10, 20]);
        assert_eq!(store.len(), 2);
    }
}
