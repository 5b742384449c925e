//! Cache Layer Module
//!
//! One named cache partition: an entry store, its configuration, and its
//! statistics. All capacity enforcement, lazy expiry, tag invalidation and
//! proactive cleanup for the partition happen here, with stats kept in
//! sync after every mutation.

use tracing::debug;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::eviction::ordered_candidates;
use crate::cache::{CacheEntry, EntryStore, LayerStats};
use crate::config::{CompressionAlgorithm, LayerConfig};
use crate::error::{CacheError, Result};
use crate::events::{CacheEvent, EventBus};

// == Lookup Outcome ==
/// Result of probing one layer for a key.
#[derive(Debug)]
pub(crate) enum Lookup {
    /// Live entry: stored bytes plus the compressor applied to them
    Hit(Vec<u8>, Option<CompressionAlgorithm>),
    /// Key absent
    Miss,
    /// Key present but past its TTL; the entry has been removed
    Expired,
}

// == Cache Layer ==
/// A named, independently configured cache partition.
#[derive(Debug)]
pub struct CacheLayer {
    name: String,
    config: LayerConfig,
    store: EntryStore,
    stats: LayerStats,
}

impl CacheLayer {
    // == Constructor ==
    /// Creates an empty layer with zeroed stats.
    pub fn new(name: impl Into<String>, config: LayerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            store: EntryStore::new(),
            stats: LayerStats::new(),
        }
    }

    // == Insert ==
    /// Stores an entry, evicting under the configured strategy first if the
    /// insert would exceed the layer's byte or count budget.
    ///
    /// A value larger than the entire byte budget is rejected outright, as
    /// is any insert into a layer with a zero entry budget: no amount of
    /// eviction could make either fit, and admitting them would leave the
    /// layer permanently over budget.
    pub fn insert(&mut self, entry: CacheEntry, events: &EventBus) -> Result<()> {
        if self.config.max_entries == 0 {
            return Err(CacheError::ZeroEntryBudget(self.name.clone()));
        }
        if entry.size_bytes > self.config.max_size_bytes {
            return Err(CacheError::EntryTooLarge {
                size: entry.size_bytes,
                max_size_bytes: self.config.max_size_bytes,
            });
        }

        self.ensure_capacity(&entry, events);

        let key = entry.key.clone();
        let size_bytes = entry.size_bytes;
        self.store.insert(entry);
        self.sync_usage();

        events.emit(&CacheEvent::Set {
            layer: self.name.clone(),
            key,
            size_bytes,
        });
        Ok(())
    }

    /// Evicts entries until the pending insert fits within both budgets.
    ///
    /// The replaced entry's size is credited back before computing the
    /// deficits, and the incoming key is never its own eviction victim.
    fn ensure_capacity(&mut self, incoming: &CacheEntry, events: &EventBus) {
        let replaced_bytes = self
            .store
            .get(&incoming.key)
            .map(|existing| existing.size_bytes);

        let projected_count = self.store.len() + usize::from(replaced_bytes.is_none());
        let projected_bytes =
            self.store.total_bytes() - replaced_bytes.unwrap_or(0) + incoming.size_bytes;

        let mut count_deficit = projected_count.saturating_sub(self.config.max_entries);
        let mut bytes_deficit = projected_bytes.saturating_sub(self.config.max_size_bytes);
        if count_deficit == 0 && bytes_deficit == 0 {
            return;
        }

        let strategy = self.config.strategy;
        for key in ordered_candidates(&self.store, strategy, Some(&incoming.key)) {
            if count_deficit == 0 && bytes_deficit == 0 {
                break;
            }
            if let Some(evicted) = self.store.remove(&key) {
                count_deficit = count_deficit.saturating_sub(1);
                bytes_deficit = bytes_deficit.saturating_sub(evicted.size_bytes);
                self.stats.record_eviction();

                debug!(
                    layer = %self.name,
                    key = %evicted.key,
                    strategy = ?strategy,
                    freed_bytes = evicted.size_bytes,
                    "evicted entry for capacity"
                );
                events.emit(&CacheEvent::Evicted {
                    layer: self.name.clone(),
                    key: evicted.key,
                    strategy,
                });
            }
        }
    }

    // == Lookup ==
    /// Probes the layer for `key`, applying lazy expiry.
    ///
    /// A hit optionally bumps the entry's access bookkeeping and records a
    /// hit; an absent key records a miss; an expired key is removed and
    /// records both an eviction and a miss on this layer.
    pub(crate) fn lookup(
        &mut self,
        key: &str,
        update_access_time: bool,
        events: &EventBus,
    ) -> Lookup {
        let now = current_timestamp_ms();

        let expired = match self.store.get(key) {
            None => {
                self.stats.record_miss();
                events.emit(&CacheEvent::Miss {
                    layer: self.name.clone(),
                    key: key.to_string(),
                });
                return Lookup::Miss;
            }
            Some(entry) => entry.is_expired_at(now),
        };

        if expired {
            self.store.remove(key);
            self.sync_usage();
            self.stats.record_eviction();
            self.stats.record_miss();

            events.emit(&CacheEvent::Expired {
                layer: self.name.clone(),
                key: key.to_string(),
            });
            events.emit(&CacheEvent::Miss {
                layer: self.name.clone(),
                key: key.to_string(),
            });
            return Lookup::Expired;
        }

        let entry = self.store.get_mut(key).expect("entry checked above");
        if update_access_time {
            entry.touch();
        }
        let value = entry.value.clone();
        let compressed = entry.compressed;

        self.stats.record_hit();
        events.emit(&CacheEvent::Hit {
            layer: self.name.clone(),
            key: key.to_string(),
        });
        Lookup::Hit(value, compressed)
    }

    // == Remove ==
    /// Removes an entry by key, returning whether anything was removed.
    pub fn remove(&mut self, key: &str, events: &EventBus) -> bool {
        let removed = self.store.remove(key).is_some();
        if removed {
            self.sync_usage();
            events.emit(&CacheEvent::Delete {
                layer: self.name.clone(),
                key: key.to_string(),
            });
        }
        removed
    }

    // == Tag Invalidation ==
    /// Removes every entry whose tag set contains `tag`; returns the count.
    pub fn invalidate_by_tag(&mut self, tag: &str, events: &EventBus) -> usize {
        let matching: Vec<String> = self
            .store
            .iter()
            .filter(|entry| entry.tags.contains(tag))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &matching {
            self.store.remove(key);
        }
        self.sync_usage();

        if !matching.is_empty() {
            events.emit(&CacheEvent::Invalidated {
                layer: self.name.clone(),
                tag: tag.to_string(),
                removed: matching.len(),
            });
        }
        matching.len()
    }

    // == Clear ==
    /// Empties the layer and resets its stats; returns the removed count.
    pub fn clear(&mut self, events: &EventBus) -> usize {
        let removed = self.store.clear();
        self.stats.reset();

        events.emit(&CacheEvent::Cleared {
            layer: self.name.clone(),
            removed,
        });
        removed
    }

    // == Cleanup Expired ==
    /// Proactive sweep: removes every expired entry, counting each as an
    /// eviction. Uses the same expiry predicate as the lazy read path.
    pub fn cleanup_expired(&mut self, events: &EventBus) -> usize {
        let now = current_timestamp_ms();
        let expired: Vec<String> = self
            .store
            .iter()
            .filter(|entry| entry.is_expired_at(now))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &expired {
            self.store.remove(key);
            self.stats.record_eviction();
            events.emit(&CacheEvent::Expired {
                layer: self.name.clone(),
                key: key.clone(),
            });
        }
        self.sync_usage();

        expired.len()
    }

    // == Snapshot ==
    /// Clones the live entries for a persistence snapshot.
    pub fn entries_snapshot(&self) -> Vec<CacheEntry> {
        self.store.iter().cloned().collect()
    }

    // == Accessors ==
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: LayerConfig) {
        self.config = config;
    }

    /// Returns a copy of the current statistics.
    pub fn stats(&self) -> LayerStats {
        self.stats.clone()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn sync_usage(&mut self) {
        self.stats
            .set_usage(self.store.len(), self.store.total_bytes());
    }
}
