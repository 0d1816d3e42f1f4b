//! Element List
//!
//! Index from weights to the elements carrying them. Node weights are unique
//! in a graph, edge weights are not, so each weight maps to a small list of
//! element ids in insertion order.

use std::hash::Hash;

use indexmap::IndexMap;
use smallvec::SmallVec;

#[derive(Debug, Clone)]
pub struct ElementList<W, I> {
    by_weight: IndexMap<W, SmallVec<[I; 1]>>,
}

impl<W: Hash + Eq, I: Copy + PartialEq> ElementList<W, I> {
    pub fn new() -> Self {
        Self {
            by_weight: IndexMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            by_weight: IndexMap::with_capacity(capacity),
        }
    }

    /// Record that element `id` carries `weight`.
    pub fn insert(&mut self, weight: W, id: I) {
        self.by_weight.entry(weight).or_default().push(id);
    }

    /// Forget that element `id` carries `weight`.
    ///
    /// Returns `false` if the association was not recorded.
    pub fn remove(&mut self, weight: &W, id: I) -> bool {
        let Some(ids) = self.by_weight.get_mut(weight) else {
            return false;
        };
        let Some(position) = ids.iter().position(|&other| other == id) else {
            return false;
        };
        ids.remove(position);
        if ids.is_empty() {
            self.by_weight.shift_remove(weight);
        }
        true
    }

    /// All elements with this weight, in insertion order.
    pub fn get(&self, weight: &W) -> &[I] {
        self.by_weight
            .get(weight)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    /// The first element inserted with this weight.
    pub fn first(&self, weight: &W) -> Option<I> {
        self.get(weight).first().copied()
    }

    pub fn contains(&self, weight: &W) -> bool {
        self.by_weight.contains_key(weight)
    }

    /// Number of distinct weights.
    pub fn weight_count(&self) -> usize {
        self.by_weight.len()
    }

    pub fn weights(&self) -> impl Iterator<Item = &W> + '_ {
        self.by_weight.keys()
    }
}

impl<W: Hash + Eq, I: Copy + PartialEq> Default for ElementList<W, I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_weights_keep_insertion_order() {
        let mut list = ElementList::new();
        list.insert("w", 1u32);
        list.insert("w", 2);
        list.insert("v", 3);

        assert_eq!(list.get(&"w"), &[1, 2]);
        assert_eq!(list.first(&"v"), Some(3));
        assert_eq!(list.weight_count(), 2);
    }

    #[test]
    fn removing_last_id_drops_weight() {
        let mut list = ElementList::new();
        list.insert('a', 7u8);
        assert!(!list.remove(&'a', 8));
        assert!(list.remove(&'a', 7));
        assert!(!list.contains(&'a'));
        assert!(list.get(&'a').is_empty());
        assert!(!list.remove(&'b', 7));
    }
}
