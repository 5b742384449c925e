//! Entry Store Module
//!
//! Insertion-ordered key/entry map for one cache layer. The insertion
//! order is the deterministic base ordering that eviction uses for
//! tie-breaking, so replacing an existing key keeps its original position
//! (Map semantics) rather than moving it to the back.

use std::collections::HashMap;

use crate::cache::CacheEntry;

// == Entry Store ==
/// Per-layer ordered key-to-entry mapping.
///
/// Total live bytes are tracked incrementally so stats can be synchronized
/// in constant time after every mutation.
#[derive(Debug, Default)]
pub struct EntryStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Keys in insertion order
    order: Vec<String>,
    /// Sum of `size_bytes` over live entries
    total_bytes: usize,
}

impl EntryStore {
    // == Constructor ==
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Inserts or replaces an entry, returning the replaced entry if any.
    pub fn insert(&mut self, entry: CacheEntry) -> Option<CacheEntry> {
        let key = entry.key.clone();
        self.total_bytes += entry.size_bytes;
        let replaced = self.entries.insert(key.clone(), entry);

        match &replaced {
            Some(old) => self.total_bytes -= old.size_bytes,
            None => self.order.push(key),
        }

        replaced
    }

    // == Remove ==
    /// Removes an entry by key, returning it if present.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let removed = self.entries.remove(key);
        if let Some(entry) = &removed {
            self.total_bytes -= entry.size_bytes;
            self.order.retain(|k| k != key);
        }
        removed
    }

    // == Lookup ==
    /// Returns a reference to the entry for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Returns a mutable reference to the entry for `key`, if present.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut CacheEntry> {
        self.entries.get_mut(key)
    }

    // == Iteration ==
    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry> {
        self.order.iter().filter_map(|key| self.entries.get(key))
    }

    /// Returns the keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.order.clone()
    }

    // == Clear ==
    /// Removes every entry, returning how many were discarded.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.order.clear();
        self.total_bytes = 0;
        removed
    }

    // == Accounting ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the sum of `size_bytes` over live entries.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }
}
