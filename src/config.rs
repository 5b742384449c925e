//! Layer Configuration Module
//!
//! Defines the per-layer configuration: capacity budgets, eviction strategy,
//! TTL defaults, and the optional compression and persistence sections.

use serde::{Deserialize, Serialize};

// == Eviction Strategy ==
/// Policy used to order eviction candidates when a layer exceeds its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionStrategy {
    /// Least recently used: oldest `last_accessed` evicted first
    Lru,
    /// Least frequently used: smallest `access_count` evicted first
    Lfu,
    /// First in, first out: oldest `created_at` evicted first
    Fifo,
    /// Arbitrary shuffled order
    Random,
}

// == Compression Algorithm ==
/// Byte compressors available to a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    Gzip,
    Brotli,
}

// == Compression Config ==
/// Optional per-layer compression of large serialized values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Whether compression is applied on the write path
    pub enabled: bool,
    /// Which compressor to use
    pub algorithm: CompressionAlgorithm,
    /// Serialized values at or below this size are stored uncompressed
    pub threshold_bytes: usize,
}

// == Persistence Config ==
/// Optional per-layer periodic snapshotting to a durable collaborator.
///
/// Persistence is best-effort: snapshots may be lost on failure and are
/// reported via notification, never raised to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Whether the persistence scheduler runs for this layer
    pub enabled: bool,
    /// Opaque identifier handed to the durable-storage sink
    pub target: String,
    /// Seconds between snapshots
    pub interval_seconds: u64,
}

// == Layer Config ==
/// Full configuration for one cache layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Maximum total bytes of stored (possibly compressed) values
    pub max_size_bytes: usize,
    /// Maximum number of live entries
    pub max_entries: usize,
    /// TTL in seconds applied to entries stored without an explicit TTL
    pub default_ttl_seconds: u64,
    /// Seconds between proactive expiry sweeps
    pub cleanup_interval_seconds: u64,
    /// Eviction policy for capacity pressure
    pub strategy: EvictionStrategy,
    /// Optional compression of large values
    pub compression: Option<CompressionConfig>,
    /// Optional periodic persistence
    pub persistence: Option<PersistenceConfig>,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 64 * 1024 * 1024,
            max_entries: 10_000,
            default_ttl_seconds: 300,
            cleanup_interval_seconds: 60,
            strategy: EvictionStrategy::Lru,
            compression: None,
            persistence: None,
        }
    }
}

// == Layer Config Patch ==
/// Partial update for [`LayerConfig`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerConfigPatch {
    pub max_size_bytes: Option<usize>,
    pub max_entries: Option<usize>,
    pub default_ttl_seconds: Option<u64>,
    pub cleanup_interval_seconds: Option<u64>,
    pub strategy: Option<EvictionStrategy>,
    pub compression: Option<CompressionConfig>,
    pub persistence: Option<PersistenceConfig>,
}

impl LayerConfigPatch {
    /// Applies the populated fields of this patch to `config`.
    pub fn apply_to(&self, config: &mut LayerConfig) {
        if let Some(v) = self.max_size_bytes {
            config.max_size_bytes = v;
        }
        if let Some(v) = self.max_entries {
            config.max_entries = v;
        }
        if let Some(v) = self.default_ttl_seconds {
            config.default_ttl_seconds = v;
        }
        if let Some(v) = self.cleanup_interval_seconds {
            config.cleanup_interval_seconds = v;
        }
        if let Some(v) = self.strategy {
            config.strategy = v;
        }
        if let Some(v) = self.compression {
            config.compression = Some(v);
        }
        if let Some(v) = self.persistence.clone() {
            config.persistence = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = LayerConfig::default();
        assert_eq!(config.max_entries, 10_000);
        assert_eq!(config.default_ttl_seconds, 300);
        assert_eq!(config.cleanup_interval_seconds, 60);
        assert_eq!(config.strategy, EvictionStrategy::Lru);
        assert!(config.compression.is_none());
        assert!(config.persistence.is_none());
    }

    #[test]
    fn test_patch_applies_only_populated_fields() {
        let mut config = LayerConfig::default();
        let patch = LayerConfigPatch {
            max_entries: Some(5),
            strategy: Some(EvictionStrategy::Fifo),
            ..Default::default()
        };

        patch.apply_to(&mut config);

        assert_eq!(config.max_entries, 5);
        assert_eq!(config.strategy, EvictionStrategy::Fifo);
        // Untouched fields keep their defaults
        assert_eq!(config.default_ttl_seconds, 300);
        assert_eq!(config.max_size_bytes, 64 * 1024 * 1024);
    }

    #[test]
    fn test_strategy_serde_lowercase() {
        let strategy: EvictionStrategy = serde_json::from_str("\"fifo\"").unwrap();
        assert_eq!(strategy, EvictionStrategy::Fifo);
        assert_eq!(
            serde_json::to_string(&EvictionStrategy::Lru).unwrap(),
            "\"lru\""
        );
    }
}
