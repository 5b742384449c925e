//! Cache Engine Module
//!
//! Layered in-memory caching: named partitions with independent capacity
//! budgets, multi-policy eviction, TTL expiry, tag invalidation, optional
//! compression, and hot-key tracking.

mod compression;
mod entry;
mod eviction;
mod layer;
mod manager;
mod stats;
mod store;
mod tracker;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use compression::{CompressionService, COMPRESSION_CACHE_MAX_ENTRIES};
pub use entry::{current_timestamp_ms, CacheEntry};
pub use layer::CacheLayer;
pub use manager::{CacheManager, GetOptions, SetOptions};
pub use stats::{LayerStats, PER_ENTRY_OVERHEAD_BYTES};
pub use store::EntryStore;
pub use tracker::{
    AccessTracker, ACCESS_WINDOW_MS, HOT_DEMOTE_THRESHOLD, HOT_PROMOTE_THRESHOLD,
    SWEEP_INTERVAL_SECONDS,
};

pub(crate) use layer::Lookup;
pub(crate) use manager::Registry;

// == Public Constants ==
/// Name of the layer that is always present and protected from removal.
pub const DEFAULT_LAYER: &str = "default";
