//! Layer Statistics Module
//!
//! Tracks per-layer performance metrics: hits, misses, evictions, live
//! usage, and the derived hit ratio.

use serde::Serialize;

/// Fixed bookkeeping overhead charged per entry when estimating memory use.
pub const PER_ENTRY_OVERHEAD_BYTES: usize = 128;

// == Layer Stats ==
/// Performance counters for one cache layer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LayerStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries removed by capacity eviction or expiry
    pub evictions: u64,
    /// Sum of stored (possibly compressed) value sizes
    pub size_bytes: usize,
    /// Current number of live entries
    pub entry_count: usize,
    /// hits / (hits + misses), 0.0 before any lookup
    pub hit_ratio: f64,
    /// size_bytes plus a fixed per-entry overhead
    pub memory_usage_bytes: usize,
}

impl LayerStats {
    // == Constructor ==
    /// Creates stats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    /// Increments the hit counter and recomputes the hit ratio.
    pub fn record_hit(&mut self) {
        self.hits += 1;
        self.recompute_hit_ratio();
    }

    // == Record Miss ==
    /// Increments the miss counter and recomputes the hit ratio.
    pub fn record_miss(&mut self) {
        self.misses += 1;
        self.recompute_hit_ratio();
    }

    // == Record Eviction ==
    /// Increments the eviction counter.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Update Usage ==
    /// Synchronizes live usage with the entry store after a mutation.
    pub fn set_usage(&mut self, entry_count: usize, size_bytes: usize) {
        self.entry_count = entry_count;
        self.size_bytes = size_bytes;
        self.memory_usage_bytes = size_bytes + entry_count * PER_ENTRY_OVERHEAD_BYTES;
    }

    // == Reset ==
    /// Zeroes every counter; used when a layer is cleared.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn recompute_hit_ratio(&mut self) {
        let total = self.hits + self.misses;
        self.hit_ratio = if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        };
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = LayerStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.entry_count, 0);
        assert_eq!(stats.hit_ratio, 0.0);
    }

    #[test]
    fn test_hit_ratio_all_hits() {
        let mut stats = LayerStats::new();
        stats.record_hit();
        stats.record_hit();
        assert_eq!(stats.hit_ratio, 1.0);
    }

    #[test]
    fn test_hit_ratio_mixed() {
        let mut stats = LayerStats::new();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_ratio, 0.5);

        stats.record_miss();
        stats.record_miss();
        assert_eq!(stats.hit_ratio, 0.25);
    }

    #[test]
    fn test_set_usage_estimates_memory() {
        let mut stats = LayerStats::new();
        stats.set_usage(3, 1000);

        assert_eq!(stats.entry_count, 3);
        assert_eq!(stats.size_bytes, 1000);
        assert_eq!(
            stats.memory_usage_bytes,
            1000 + 3 * PER_ENTRY_OVERHEAD_BYTES
        );
    }

    #[test]
    fn test_reset() {
        let mut stats = LayerStats::new();
        stats.record_hit();
        stats.record_miss();
        stats.record_eviction();
        stats.set_usage(2, 64);

        stats.reset();

        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.entry_count, 0);
        assert_eq!(stats.memory_usage_bytes, 0);
    }
}
