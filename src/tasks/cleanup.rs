//! TTL Cleanup Task
//!
//! Background task that periodically removes expired entries from one
//! layer, independent of read activity. Each layer runs its own task, so
//! a problem in one layer's sweep never stalls the others.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::Registry;
use crate::events::{CacheEvent, EventBus};

/// Spawns the proactive expiry sweep for one layer.
///
/// The task sleeps for `interval_secs` between sweeps, acquires the
/// registry write lock, and removes every entry past its TTL through the
/// same expiry predicate the lazy read path uses. The loop ends on abort
/// (layer removal, config restart, or `destroy`) or when the layer has
/// vanished from the registry.
///
/// # Arguments
/// * `registry` - Shared layer registry
/// * `events` - Notification bus for "cleanup completed" events
/// * `layer` - Name of the layer this task sweeps
/// * `interval_secs` - Seconds between sweeps
pub(crate) fn spawn_cleanup_task(
    registry: Arc<RwLock<Registry>>,
    events: Arc<EventBus>,
    layer: String,
    interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(layer = %layer, interval_secs, "starting TTL cleanup task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut registry = registry.write().await;
                match registry.get_mut(&layer) {
                    Some(target) => target.cleanup_expired(&events),
                    None => break,
                }
            };

            if removed > 0 {
                info!(layer = %layer, removed, "TTL cleanup removed expired entries");
            } else {
                debug!(layer = %layer, "TTL cleanup found no expired entries");
            }
            events.emit(&CacheEvent::CleanupCompleted {
                layer: layer.clone(),
                removed,
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheEntry, CacheLayer};
    use crate::config::LayerConfig;
    use std::collections::{HashMap, HashSet};
    use std::time::Duration;

    fn registry_with_layer(name: &str) -> Arc<RwLock<Registry>> {
        let mut registry = Registry::new();
        registry.insert(CacheLayer::new(name, LayerConfig::default()));
        Arc::new(RwLock::new(registry))
    }

    fn short_lived_entry(key: &str) -> CacheEntry {
        let mut entry = CacheEntry::new(
            key.to_string(),
            b"value".to_vec(),
            None,
            1000,
            HashSet::new(),
            HashMap::new(),
        );
        entry.created_at -= 5000;
        entry
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let registry = registry_with_layer("l");
        let events = Arc::new(EventBus::new());

        {
            let mut guard = registry.write().await;
            let layer = guard.get_mut("l").unwrap();
            layer.insert(short_lived_entry("stale"), &events).unwrap();
        }

        let handle = spawn_cleanup_task(registry.clone(), events.clone(), "l".to_string(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        {
            let guard = registry.read().await;
            assert!(guard.get("l").unwrap().is_empty());
            assert_eq!(guard.get("l").unwrap().stats().evictions, 1);
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_live_entries() {
        let registry = registry_with_layer("l");
        let events = Arc::new(EventBus::new());

        {
            let mut guard = registry.write().await;
            let layer = guard.get_mut("l").unwrap();
            let entry = CacheEntry::new(
                "fresh".to_string(),
                b"value".to_vec(),
                None,
                3_600_000,
                HashSet::new(),
                HashMap::new(),
            );
            layer.insert(entry, &events).unwrap();
        }

        let handle = spawn_cleanup_task(registry.clone(), events.clone(), "l".to_string(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        {
            let guard = registry.read().await;
            assert_eq!(guard.get("l").unwrap().len(), 1);
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_ends_when_layer_removed() {
        let registry = registry_with_layer("gone");
        let events = Arc::new(EventBus::new());

        let handle = spawn_cleanup_task(registry.clone(), events, "gone".to_string(), 1);

        registry.write().await.remove("gone");
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let registry = registry_with_layer("l");
        let events = Arc::new(EventBus::new());

        let handle = spawn_cleanup_task(registry, events, "l".to_string(), 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished());
    }
}
