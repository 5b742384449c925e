//! Cache Manager Module
//!
//! The layer registry and public API of the caching engine. A manager owns
//! a set of named layers (probed in registration order), the hot-key
//! tracker, the compression service, the event bus, and the background
//! task handles for cleanup, persistence and hot-key sweeps.
//!
//! A `CacheManager` is an explicitly constructed instance meant to be
//! dependency-injected into consumers; it must be created inside a Tokio
//! runtime because it spawns its background tasks at construction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{
    AccessTracker, CacheEntry, CacheLayer, CompressionService, LayerStats, Lookup, DEFAULT_LAYER,
};
use crate::config::{LayerConfig, LayerConfigPatch};
use crate::error::{CacheError, Result};
use crate::events::{CacheEvent, EventBus, EventKind};
use crate::tasks::{
    spawn_cleanup_task, spawn_hot_key_sweep, spawn_persistence_task, PersistenceSink,
};

// == Registry ==
/// Named layers in registration order.
///
/// Registration order is observable: the multi-layer `get` fallback probes
/// layers in exactly this order. Re-registering a name replaces the layer
/// but keeps its original position.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    layers: HashMap<String, CacheLayer>,
    order: Vec<String>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, layer: CacheLayer) {
        let name = layer.name().to_string();
        if self.layers.insert(name.clone(), layer).is_none() {
            self.order.push(name);
        }
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<CacheLayer> {
        let removed = self.layers.remove(name);
        if removed.is_some() {
            self.order.retain(|n| n != name);
        }
        removed
    }

    pub(crate) fn get(&self, name: &str) -> Option<&CacheLayer> {
        self.layers.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut CacheLayer> {
        self.layers.get_mut(name)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    /// Layer names in registration order.
    pub(crate) fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    pub(crate) fn clear(&mut self) {
        self.layers.clear();
        self.order.clear();
    }
}

// == Operation Options ==
/// Options for [`CacheManager::set`].
#[derive(Debug, Clone, Default)]
pub struct SetOptions {
    /// TTL in seconds; the layer's default applies when absent
    pub ttl_seconds: Option<u64>,
    /// Target layer; `"default"` when absent
    pub layer: Option<String>,
    /// Tags enabling bulk invalidation
    pub tags: Vec<String>,
    /// Opaque annotations stored alongside the value
    pub metadata: HashMap<String, serde_json::Value>,
}

impl SetOptions {
    pub fn layer(name: impl Into<String>) -> Self {
        Self {
            layer: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_ttl(mut self, seconds: u64) -> Self {
        self.ttl_seconds = Some(seconds);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Options for [`CacheManager::get`].
#[derive(Debug, Clone)]
pub struct GetOptions {
    /// Probe only this layer; probe all layers in registration order when
    /// absent
    pub layer: Option<String>,
    /// Whether a hit bumps `last_accessed`/`access_count`
    pub update_access_time: bool,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            layer: None,
            update_access_time: true,
        }
    }
}

impl GetOptions {
    pub fn layer(name: impl Into<String>) -> Self {
        Self {
            layer: Some(name.into()),
            ..Default::default()
        }
    }
}

// == Task Handles ==
#[derive(Debug)]
struct LayerTasks {
    cleanup: JoinHandle<()>,
    persistence: Option<JoinHandle<()>>,
}

impl LayerTasks {
    fn abort(&self) {
        self.cleanup.abort();
        if let Some(handle) = &self.persistence {
            handle.abort();
        }
    }
}

#[derive(Debug, Default)]
struct TaskSet {
    per_layer: HashMap<String, LayerTasks>,
    hot_key_sweep: Option<JoinHandle<()>>,
}

// == Cache Manager ==
/// Layered in-memory cache engine.
#[derive(Clone)]
pub struct CacheManager {
    registry: Arc<RwLock<Registry>>,
    tracker: Arc<RwLock<AccessTracker>>,
    compression: Arc<CompressionService>,
    events: Arc<EventBus>,
    sink: Option<Arc<dyn PersistenceSink>>,
    tasks: Arc<StdMutex<TaskSet>>,
}

impl CacheManager {
    // == Constructors ==
    /// Creates a manager whose `default` layer uses `default_config`, with
    /// no persistence sink. Must be called within a Tokio runtime.
    pub fn new(default_config: LayerConfig) -> Self {
        Self::build(default_config, None)
    }

    /// Creates a manager with a durable-storage sink for layers that
    /// configure persistence.
    pub fn with_sink(default_config: LayerConfig, sink: Arc<dyn PersistenceSink>) -> Self {
        Self::build(default_config, Some(sink))
    }

    fn build(default_config: LayerConfig, sink: Option<Arc<dyn PersistenceSink>>) -> Self {
        let mut registry = Registry::new();
        registry.insert(CacheLayer::new(DEFAULT_LAYER, default_config.clone()));

        let manager = Self {
            registry: Arc::new(RwLock::new(registry)),
            tracker: Arc::new(RwLock::new(AccessTracker::new())),
            compression: Arc::new(CompressionService::new()),
            events: Arc::new(EventBus::new()),
            sink,
            tasks: Arc::new(StdMutex::new(TaskSet::default())),
        };

        manager.start_layer_tasks(DEFAULT_LAYER, &default_config);
        manager.tasks.lock().expect("task set lock poisoned").hot_key_sweep = Some(
            spawn_hot_key_sweep(manager.tracker.clone(), manager.events.clone()),
        );

        info!("cache manager initialized with default layer");
        manager
    }

    // == Layer Lifecycle ==
    /// Registers (or replaces) a layer and starts its schedulers.
    ///
    /// Re-adding an existing name replaces that layer wholesale: its
    /// entries are discarded and its timers restarted.
    pub async fn add_layer(&self, name: impl Into<String>, config: LayerConfig) {
        let name = name.into();
        {
            let mut registry = self.registry.write().await;
            registry.insert(CacheLayer::new(name.clone(), config.clone()));
        }
        self.start_layer_tasks(&name, &config);

        info!(layer = %name, "cache layer added");
        self.events.emit(&CacheEvent::LayerAdded { layer: name });
    }

    /// Removes a layer, discarding its entries and stopping its timers.
    /// The `default` layer is protected.
    pub async fn remove_layer(&self, name: &str) -> Result<()> {
        if name == DEFAULT_LAYER {
            return Err(CacheError::ProtectedLayer(name.to_string()));
        }

        let removed = {
            let mut registry = self.registry.write().await;
            registry.remove(name)
        };
        if removed.is_none() {
            return Err(CacheError::UnknownLayer(name.to_string()));
        }
        self.stop_layer_tasks(name);

        info!(layer = %name, "cache layer removed");
        self.events.emit(&CacheEvent::LayerRemoved {
            layer: name.to_string(),
        });
        Ok(())
    }

    /// Layer names in registration order.
    pub async fn layers(&self) -> Vec<String> {
        self.registry.read().await.names()
    }

    /// Returns a copy of one layer's configuration.
    pub async fn layer_config(&self, name: &str) -> Result<LayerConfig> {
        let registry = self.registry.read().await;
        registry
            .get(name)
            .map(|layer| layer.config().clone())
            .ok_or_else(|| CacheError::UnknownLayer(name.to_string()))
    }

    /// Applies a partial configuration update to a layer.
    ///
    /// Changing `cleanup_interval_seconds` restarts the cleanup scheduler
    /// with the new period; changing the persistence section restarts the
    /// persistence scheduler.
    pub async fn update_layer_config(&self, name: &str, patch: LayerConfigPatch) -> Result<()> {
        let (old, new) = {
            let mut registry = self.registry.write().await;
            let layer = registry
                .get_mut(name)
                .ok_or_else(|| CacheError::UnknownLayer(name.to_string()))?;

            let old = layer.config().clone();
            let mut updated = old.clone();
            patch.apply_to(&mut updated);
            layer.set_config(updated.clone());
            (old, updated)
        };

        if new.cleanup_interval_seconds != old.cleanup_interval_seconds
            || new.persistence != old.persistence
        {
            self.start_layer_tasks(name, &new);
        }

        info!(layer = %name, "cache layer config updated");
        self.events.emit(&CacheEvent::LayerConfigUpdated {
            layer: name.to_string(),
        });
        Ok(())
    }

    // == Write Path ==
    /// Serializes `value`, compresses it when the target layer's policy
    /// asks for it, and stores it under `key`, evicting for capacity first.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, opts: SetOptions) -> Result<()> {
        let layer_name = opts.layer.unwrap_or_else(|| DEFAULT_LAYER.to_string());
        let serialized = serde_json::to_vec(value)?;

        let mut registry = self.registry.write().await;
        let layer = registry
            .get_mut(&layer_name)
            .ok_or_else(|| CacheError::UnknownLayer(layer_name.clone()))?;
        let config = layer.config().clone();

        let (stored, compressed) = match config.compression {
            Some(c) if c.enabled && serialized.len() > c.threshold_bytes => {
                let bytes = self.compression.compress(&serialized, c.algorithm)?;
                (bytes, Some(c.algorithm))
            }
            _ => (serialized, None),
        };

        let ttl_ms = opts
            .ttl_seconds
            .unwrap_or(config.default_ttl_seconds)
            .saturating_mul(1000);
        let entry = CacheEntry::new(
            key.to_string(),
            stored,
            compressed,
            ttl_ms,
            opts.tags.into_iter().collect(),
            opts.metadata,
        );

        debug!(layer = %layer_name, key = %key, size_bytes = entry.size_bytes, "set");
        layer.insert(entry, &self.events)
    }

    // == Read Path ==
    /// Retrieves a value by key.
    ///
    /// With an explicit layer only that layer is probed; otherwise layers
    /// are probed in registration order until a hit. Every probed layer
    /// that does not hit records its own miss, so one logical lookup can
    /// increment miss counters on several layers. Expired entries are
    /// lazily removed, counting an eviction and a miss on their layer.
    pub async fn get<T: DeserializeOwned>(&self, key: &str, opts: GetOptions) -> Result<Option<T>> {
        let mut registry = self.registry.write().await;

        let probe_order = match &opts.layer {
            Some(name) => {
                if !registry.contains(name) {
                    return Err(CacheError::UnknownLayer(name.clone()));
                }
                vec![name.clone()]
            }
            None => registry.names(),
        };

        for name in probe_order {
            let layer = match registry.get_mut(&name) {
                Some(layer) => layer,
                None => continue,
            };
            match layer.lookup(key, opts.update_access_time, &self.events) {
                Lookup::Hit(bytes, algorithm) => {
                    drop(registry);

                    let raw = match algorithm {
                        Some(alg) => self.compression.decompress(&bytes, alg)?,
                        None => bytes,
                    };
                    let value = serde_json::from_slice(&raw)?;

                    let mut tracker = self.tracker.write().await;
                    tracker.record_access(key, current_timestamp_ms());
                    return Ok(Some(value));
                }
                Lookup::Miss | Lookup::Expired => continue,
            }
        }

        Ok(None)
    }

    // == Deletion ==
    /// Removes `key` from one layer, or from every layer containing it
    /// when no layer is given. Returns whether anything was removed.
    ///
    /// Removing the key from every layer also drops its hot-key tracking
    /// state; a layer-scoped delete keeps it, since the key may still be
    /// readable from another layer.
    pub async fn delete(&self, key: &str, layer: Option<&str>) -> Result<bool> {
        let mut registry = self.registry.write().await;

        match layer {
            Some(name) => {
                let layer = registry
                    .get_mut(name)
                    .ok_or_else(|| CacheError::UnknownLayer(name.to_string()))?;
                Ok(layer.remove(key, &self.events))
            }
            None => {
                let mut any_removed = false;
                for name in registry.names() {
                    if let Some(layer) = registry.get_mut(&name) {
                        any_removed |= layer.remove(key, &self.events);
                    }
                }
                drop(registry);

                if any_removed {
                    self.tracker.write().await.forget(key);
                }
                Ok(any_removed)
            }
        }
    }

    /// Removes every entry tagged with `tag` in the targeted layer(s);
    /// returns the total removed count.
    pub async fn invalidate_by_tag(&self, tag: &str, layer: Option<&str>) -> Result<usize> {
        let mut registry = self.registry.write().await;

        match layer {
            Some(name) => {
                let layer = registry
                    .get_mut(name)
                    .ok_or_else(|| CacheError::UnknownLayer(name.to_string()))?;
                Ok(layer.invalidate_by_tag(tag, &self.events))
            }
            None => {
                let mut removed = 0;
                for name in registry.names() {
                    if let Some(layer) = registry.get_mut(&name) {
                        removed += layer.invalidate_by_tag(tag, &self.events);
                    }
                }
                Ok(removed)
            }
        }
    }

    /// Empties one layer, or every layer, resetting stats to zero.
    pub async fn clear(&self, layer: Option<&str>) -> Result<()> {
        let mut registry = self.registry.write().await;

        match layer {
            Some(name) => {
                let layer = registry
                    .get_mut(name)
                    .ok_or_else(|| CacheError::UnknownLayer(name.to_string()))?;
                let removed = layer.clear(&self.events);
                info!(layer = %name, removed, "cache layer cleared");
            }
            None => {
                for name in registry.names() {
                    if let Some(layer) = registry.get_mut(&name) {
                        let removed = layer.clear(&self.events);
                        info!(layer = %name, removed, "cache layer cleared");
                    }
                }
            }
        }
        Ok(())
    }

    // == Observability ==
    /// Returns one layer's statistics.
    pub async fn layer_stats(&self, name: &str) -> Result<LayerStats> {
        let registry = self.registry.read().await;
        registry
            .get(name)
            .map(|layer| layer.stats())
            .ok_or_else(|| CacheError::UnknownLayer(name.to_string()))
    }

    /// Returns a name-to-stats map covering every layer.
    pub async fn all_stats(&self) -> HashMap<String, LayerStats> {
        let registry = self.registry.read().await;
        registry
            .names()
            .into_iter()
            .filter_map(|name| {
                let stats = registry.get(&name)?.stats();
                Some((name, stats))
            })
            .collect()
    }

    /// Returns the currently hot keys.
    pub async fn hot_keys(&self) -> Vec<String> {
        self.tracker.read().await.hot_keys()
    }

    /// Registers an event handler for notifications of `kind`.
    pub fn on_event<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        self.events.on_event(kind, handler);
    }

    // == Shutdown ==
    /// Stops every timer and discards all in-memory structures.
    pub async fn destroy(&self) {
        {
            let mut tasks = self.tasks.lock().expect("task set lock poisoned");
            for (_, handles) in tasks.per_layer.drain() {
                handles.abort();
            }
            if let Some(sweep) = tasks.hot_key_sweep.take() {
                sweep.abort();
            }
        }

        self.registry.write().await.clear();
        self.tracker.write().await.clear();
        self.compression.clear();
        info!("cache manager destroyed");
    }

    // == Task Management ==
    fn start_layer_tasks(&self, name: &str, config: &LayerConfig) {
        let mut tasks = self.tasks.lock().expect("task set lock poisoned");
        if let Some(old) = tasks.per_layer.remove(name) {
            old.abort();
        }

        let cleanup = spawn_cleanup_task(
            self.registry.clone(),
            self.events.clone(),
            name.to_string(),
            config.cleanup_interval_seconds,
        );

        let persistence = match (&config.persistence, &self.sink) {
            (Some(p), Some(sink)) if p.enabled => Some(spawn_persistence_task(
                self.registry.clone(),
                self.events.clone(),
                sink.clone(),
                name.to_string(),
                p.target.clone(),
                p.interval_seconds,
            )),
            _ => None,
        };

        tasks
            .per_layer
            .insert(name.to_string(), LayerTasks { cleanup, persistence });
    }

    fn stop_layer_tasks(&self, name: &str) {
        let mut tasks = self.tasks.lock().expect("task set lock poisoned");
        if let Some(handles) = tasks.per_layer.remove(name) {
            handles.abort();
        }
    }
}
