//! Eviction Engine Module
//!
//! Orders eviction candidates according to a layer's configured strategy.
//! The candidate base ordering is the store's insertion order and every
//! sort is stable, so ties break deterministically for a given entry set.

use rand::seq::SliceRandom;
use rand::thread_rng;

use crate::cache::{CacheEntry, EntryStore};
use crate::config::EvictionStrategy;

// == Candidate Ordering ==
/// Returns keys in the order they should be evicted under `strategy`.
///
/// `exclude` removes one key from consideration; the write path uses it so
/// an entry being replaced is never chosen as its own eviction victim.
pub(crate) fn ordered_candidates(
    store: &EntryStore,
    strategy: EvictionStrategy,
    exclude: Option<&str>,
) -> Vec<String> {
    let mut candidates: Vec<&CacheEntry> = store
        .iter()
        .filter(|entry| exclude != Some(entry.key.as_str()))
        .collect();

    match strategy {
        EvictionStrategy::Lru => candidates.sort_by_key(|entry| entry.last_accessed),
        EvictionStrategy::Lfu => candidates.sort_by_key(|entry| entry.access_count),
        EvictionStrategy::Fifo => candidates.sort_by_key(|entry| entry.created_at),
        EvictionStrategy::Random => candidates.shuffle(&mut thread_rng()),
    }

    candidates.into_iter().map(|entry| entry.key.clone()).collect()
}
