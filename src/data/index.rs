//! Bidirectional id ↔ contiguous-index mapping.

use std::collections::HashMap;
use std::hash::Hash;

/// Maps external ids to contiguous internal indices in first-seen order.
///
/// The reverse lookup (`id`, `ids`) preserves interning order, which is
/// the canonical enumeration order of the trained model.
#[derive(Debug, Clone)]
pub struct IdIndex<K> {
    map: HashMap<K, usize>,
    ids: Vec<K>,
}

impl<K: Clone + Eq + Hash> IdIndex<K> {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            ids: Vec::new(),
        }
    }

    /// Returns the internal index for `key`, assigning the next
    /// contiguous index on first sight.
    pub fn intern(&mut self, key: &K) -> usize {
        if let Some(&index) = self.map.get(key) {
            return index;
        }
        let index = self.ids.len();
        self.map.insert(key.clone(), index);
        self.ids.push(key.clone());
        index
    }

    /// Returns the internal index for `key`, if known.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<usize> {
        self.map.get(key).copied()
    }

    /// Returns the external id for an internal index.
    ///
    /// # Panics
    ///
    /// Panics if `index` was never assigned.
    #[must_use]
    pub fn id(&self, index: usize) -> &K {
        &self.ids[index]
    }

    /// Returns all ids in interning order.
    #[must_use]
    pub fn ids(&self) -> &[K] {
        &self.ids
    }

    /// Returns the number of interned ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if nothing has been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<K: Clone + Eq + Hash> Default for IdIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}
