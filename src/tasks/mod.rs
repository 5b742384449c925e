//! Background Tasks Module
//!
//! Scheduled loops operating on the cache through the registry: proactive
//! TTL cleanup, periodic persistence snapshots, and hot-key sweeps.

mod cleanup;
mod hotkeys;
mod persistence;

pub use persistence::{LayerSnapshot, PersistenceSink};

pub(crate) use cleanup::spawn_cleanup_task;
pub(crate) use hotkeys::spawn_hot_key_sweep;
pub(crate) use persistence::spawn_persistence_task;
