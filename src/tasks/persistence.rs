//! Persistence Task
//!
//! Periodic best-effort snapshotting of a layer's entries to an external
//! durable-storage collaborator. Snapshot failures are caught, logged,
//! and reported via notification; they never fail the triggering
//! operation and never crash the scheduler.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, Registry};
use crate::events::{CacheEvent, EventBus};

// == Layer Snapshot ==
/// Serialized view of a layer's live entries at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSnapshot {
    /// Source layer name
    pub layer: String,
    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,
    /// Live entries at snapshot time
    pub entries: Vec<CacheEntry>,
}

// == Persistence Sink ==
/// External durable-storage collaborator that accepts layer snapshots.
///
/// `target` is the opaque destination identifier from the layer's
/// persistence configuration. Implementations may fail; the scheduler
/// treats every failure as non-fatal.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn persist(&self, target: &str, snapshot: LayerSnapshot) -> anyhow::Result<()>;
}

/// Spawns the periodic persistence snapshot task for one layer.
///
/// The snapshot is cloned out under the registry read lock, which is
/// released before the sink is awaited so a slow collaborator never
/// blocks cache operations.
pub(crate) fn spawn_persistence_task(
    registry: Arc<RwLock<Registry>>,
    events: Arc<EventBus>,
    sink: Arc<dyn PersistenceSink>,
    layer: String,
    target: String,
    interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(layer = %layer, target = %target, interval_secs, "starting persistence task");

        loop {
            tokio::time::sleep(interval).await;

            let snapshot = {
                let registry = registry.read().await;
                match registry.get(&layer) {
                    Some(target_layer) => LayerSnapshot {
                        layer: layer.clone(),
                        taken_at: Utc::now(),
                        entries: target_layer.entries_snapshot(),
                    },
                    None => break,
                }
            };
            let entry_count = snapshot.entries.len();

            match sink.persist(&target, snapshot).await {
                Ok(()) => {
                    debug!(layer = %layer, entries = entry_count, "persistence snapshot written");
                    events.emit(&CacheEvent::PersistenceCompleted {
                        layer: layer.clone(),
                        entries: entry_count,
                    });
                }
                Err(error) => {
                    warn!(layer = %layer, %error, "persistence snapshot failed");
                    events.emit(&CacheEvent::PersistenceFailed {
                        layer: layer.clone(),
                        reason: error.to_string(),
                    });
                }
            }
        }
    })
}
