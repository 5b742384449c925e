//! Hot-Key Sweep Task
//!
//! Periodically prunes dead access windows, re-evaluates hot/cold status
//! for every tracked key, and publishes the updated hot set.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{current_timestamp_ms, AccessTracker, SWEEP_INTERVAL_SECONDS};
use crate::events::{CacheEvent, EventBus};

/// Spawns the periodic access-tracker sweep.
pub(crate) fn spawn_hot_key_sweep(
    tracker: Arc<RwLock<AccessTracker>>,
    events: Arc<EventBus>,
) -> JoinHandle<()> {
    let interval = std::time::Duration::from_secs(SWEEP_INTERVAL_SECONDS);

    tokio::spawn(async move {
        info!(interval_secs = SWEEP_INTERVAL_SECONDS, "starting hot-key sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let hot = {
                let mut tracker = tracker.write().await;
                tracker.sweep(current_timestamp_ms())
            };

            debug!(hot_keys = hot.len(), "hot-key sweep completed");
            events.emit(&CacheEvent::HotKeysUpdated { keys: hot });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let tracker = Arc::new(RwLock::new(AccessTracker::new()));
        let events = Arc::new(EventBus::new());

        let handle = spawn_hot_key_sweep(tracker, events);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished());
    }
}
