//! Labeled List
//!
//! An insertion-ordered collection that assigns each entry a dense integer
//! label `0..len`. Both directions of the label mapping are O(1): label to
//! entry by index, entry to label by hash lookup.
//!
//! Removing an entry shifts the labels of every later entry down by one, so
//! labels always stay a bijection with the entries currently present.

use std::hash::Hash;

use indexmap::IndexMap;

#[derive(Debug, Clone)]
pub struct LabeledList<K, V> {
    entries: IndexMap<K, V>,
}

impl<K: Hash + Eq + Copy, V> LabeledList<K, V> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Append an entry and return its label.
    ///
    /// An existing key keeps its label and has its value replaced.
    pub fn insert(&mut self, key: K, value: V) -> usize {
        self.entries.insert_full(key, value).0
    }

    /// Remove an entry, shifting later labels down.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.shift_remove(key)
    }

    pub fn label(&self, key: &K) -> Option<usize> {
        self.entries.get_index_of(key)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    /// The key currently holding `label`.
    pub fn key_at(&self, label: usize) -> Option<K> {
        self.entries.get_index(label).map(|(key, _)| *key)
    }

    pub fn value_at(&self, label: usize) -> Option<&V> {
        self.entries.get_index(label).map(|(_, value)| value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in label order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.entries.keys().copied()
    }

    /// Values in label order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.entries.values()
    }
}

impl<K: Hash + Eq + Copy, V> Default for LabeledList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
