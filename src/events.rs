//! Cache Event Notifications
//!
//! Observer-style notification surface for the caching engine. Subscribers
//! register a handler for a specific [`EventKind`]; the engine invokes every
//! matching handler synchronously as operations complete.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::EvictionStrategy;

// == Cache Event ==
/// One observable notification emitted by the engine.
#[derive(Debug, Clone)]
pub enum CacheEvent {
    LayerAdded {
        layer: String,
    },
    LayerRemoved {
        layer: String,
    },
    LayerConfigUpdated {
        layer: String,
    },
    /// A value was stored (possibly replacing an earlier one)
    Set {
        layer: String,
        key: String,
        size_bytes: usize,
    },
    Hit {
        layer: String,
        key: String,
    },
    Miss {
        layer: String,
        key: String,
    },
    Delete {
        layer: String,
        key: String,
    },
    /// A live entry was removed to satisfy a capacity budget
    Evicted {
        layer: String,
        key: String,
        strategy: EvictionStrategy,
    },
    /// An entry was removed because its TTL elapsed
    Expired {
        layer: String,
        key: String,
    },
    Cleared {
        layer: String,
        removed: usize,
    },
    Invalidated {
        layer: String,
        tag: String,
        removed: usize,
    },
    CleanupCompleted {
        layer: String,
        removed: usize,
    },
    PersistenceCompleted {
        layer: String,
        entries: usize,
    },
    PersistenceFailed {
        layer: String,
        reason: String,
    },
    HotKeysUpdated {
        keys: Vec<String>,
    },
}

// == Event Kind ==
/// Discriminant used for handler registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    LayerAdded,
    LayerRemoved,
    LayerConfigUpdated,
    Set,
    Hit,
    Miss,
    Delete,
    Evicted,
    Expired,
    Cleared,
    Invalidated,
    CleanupCompleted,
    PersistenceCompleted,
    PersistenceFailed,
    HotKeysUpdated,
}

impl CacheEvent {
    /// Returns the registration kind for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            CacheEvent::LayerAdded { .. } => EventKind::LayerAdded,
            CacheEvent::LayerRemoved { .. } => EventKind::LayerRemoved,
            CacheEvent::LayerConfigUpdated { .. } => EventKind::LayerConfigUpdated,
            CacheEvent::Set { .. } => EventKind::Set,
            CacheEvent::Hit { .. } => EventKind::Hit,
            CacheEvent::Miss { .. } => EventKind::Miss,
            CacheEvent::Delete { .. } => EventKind::Delete,
            CacheEvent::Evicted { .. } => EventKind::Evicted,
            CacheEvent::Expired { .. } => EventKind::Expired,
            CacheEvent::Cleared { .. } => EventKind::Cleared,
            CacheEvent::Invalidated { .. } => EventKind::Invalidated,
            CacheEvent::CleanupCompleted { .. } => EventKind::CleanupCompleted,
            CacheEvent::PersistenceCompleted { .. } => EventKind::PersistenceCompleted,
            CacheEvent::PersistenceFailed { .. } => EventKind::PersistenceFailed,
            CacheEvent::HotKeysUpdated { .. } => EventKind::HotKeysUpdated,
        }
    }
}

/// Callback invoked with a matching event.
pub type EventHandler = Arc<dyn Fn(&CacheEvent) + Send + Sync>;

// == Event Bus ==
/// Handler registry shared by the engine and its background tasks.
#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<HashMap<EventKind, Vec<EventHandler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for every future event of `kind`.
    pub fn on_event<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.lock().expect("event handler lock poisoned");
        handlers.entry(kind).or_default().push(Arc::new(handler));
    }

    /// Invokes every handler registered for the event's kind.
    ///
    /// A snapshot of the handler list is taken before invocation so a
    /// subscriber registering from inside a handler cannot deadlock the
    /// bus.
    pub fn emit(&self, event: &CacheEvent) {
        let snapshot: Vec<EventHandler> = {
            let handlers = self.handlers.lock().expect("event handler lock poisoned");
            match handlers.get(&event.kind()) {
                Some(list) => list.clone(),
                None => return,
            }
        };

        for handler in snapshot {
            handler(event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count: usize = self
            .handlers
            .lock()
            .map(|h| h.values().map(Vec::len).sum())
            .unwrap_or(0);
        f.debug_struct("EventBus").field("handlers", &count).finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_emit_invokes_matching_handlers() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        bus.on_event(EventKind::Hit, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(&CacheEvent::Hit {
            layer: "default".to_string(),
            key: "k".to_string(),
        });
        bus.emit(&CacheEvent::Miss {
            layer: "default".to_string(),
            key: "k".to_string(),
        });

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_emit_without_handlers_is_noop() {
        let bus = EventBus::new();
        bus.emit(&CacheEvent::Cleared {
            layer: "default".to_string(),
            removed: 0,
        });
    }

    #[test]
    fn test_multiple_handlers_for_same_kind() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = calls.clone();
            bus.on_event(EventKind::Evicted, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        bus.emit(&CacheEvent::Evicted {
            layer: "default".to_string(),
            key: "k".to_string(),
            strategy: EvictionStrategy::Lru,
        });

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
