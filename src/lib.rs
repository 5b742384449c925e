//! Layer Cache - A layered in-memory caching engine
//!
//! Key-addressed values behind named, independently configured layers,
//! each with its own capacity budgets, eviction policy, TTL expiry,
//! optional value compression, optional periodic persistence, and
//! hit/miss statistics.

pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod tasks;

pub use cache::{CacheManager, GetOptions, LayerStats, SetOptions, DEFAULT_LAYER};
pub use config::{
    CompressionAlgorithm, CompressionConfig, EvictionStrategy, LayerConfig, LayerConfigPatch,
    PersistenceConfig,
};
pub use error::{CacheError, Result};
pub use events::{CacheEvent, EventKind};
pub use tasks::{LayerSnapshot, PersistenceSink};
