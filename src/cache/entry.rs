//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support,
//! tags for bulk invalidation, and access bookkeeping for eviction.

use std::collections::{HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::config::CompressionAlgorithm;

// == Cache Entry ==
/// Represents a single stored value and its metadata.
///
/// The value is held as its canonical serialized bytes, possibly compressed;
/// `size_bytes` is the length of that stored representation and is what
/// capacity accounting uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Key, unique within its layer
    pub key: String,
    /// Serialized (and possibly compressed) value bytes
    pub value: Vec<u8>,
    /// Compressor applied to `value`, if any
    pub compressed: Option<CompressionAlgorithm>,
    /// Time-to-live from creation, in milliseconds
    pub ttl_ms: u64,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Last successful read timestamp (Unix milliseconds)
    pub last_accessed: u64,
    /// Incremented on every read that requests access-time updates
    pub access_count: u64,
    /// Byte length of the stored representation
    pub size_bytes: usize,
    /// Labels enabling bulk invalidation
    pub tags: HashSet<String>,
    /// Opaque caller-supplied annotations, never interpreted by the engine
    pub metadata: HashMap<String, serde_json::Value>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped at the current time.
    ///
    /// # Arguments
    /// * `key` - The key to store under
    /// * `value` - Serialized (possibly compressed) value bytes
    /// * `compressed` - Compressor applied to `value`, if any
    /// * `ttl_ms` - Time-to-live from now, in milliseconds
    /// * `tags` - Labels for bulk invalidation
    /// * `metadata` - Opaque caller annotations
    pub fn new(
        key: String,
        value: Vec<u8>,
        compressed: Option<CompressionAlgorithm>,
        ttl_ms: u64,
        tags: HashSet<String>,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Self {
        let now = current_timestamp_ms();
        let size_bytes = value.len();

        Self {
            key,
            value,
            compressed,
            ttl_ms,
            created_at: now,
            last_accessed: now,
            access_count: 1,
            size_bytes,
            tags,
            metadata,
        }
    }

    // == Is Expired ==
    /// Shared expiry predicate: an entry is expired once
    /// `created_at + ttl_ms < now`.
    ///
    /// Both the lazy-on-read path and the proactive cleanup sweep must go
    /// through this one predicate so the two paths can never diverge.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        self.created_at.saturating_add(self.ttl_ms) < now_ms
    }

    /// Checks expiry against the current wall clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    // == Touch ==
    /// Records a successful read: bumps `last_accessed` and `access_count`.
    pub fn touch(&mut self) {
        self.last_accessed = current_timestamp_ms();
        self.access_count += 1;
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, clamped at zero once elapsed.
    pub fn ttl_remaining_ms(&self) -> u64 {
        let deadline = self.created_at.saturating_add(self.ttl_ms);
        deadline.saturating_sub(current_timestamp_ms())
    }

    /// Returns remaining TTL in whole seconds.
    pub fn ttl_remaining(&self) -> u64 {
        self.ttl_remaining_ms() / 1000
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
