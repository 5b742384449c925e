//! Access Tracker Module
//!
//! Hot-key detection over a sliding window. Each read hit appends the
//! current instant to the key's window and prunes instants older than one
//! hour; a key is hot once its window holds more than ten accesses and is
//! demoted once it falls below five.

use std::collections::{HashMap, HashSet, VecDeque};

// == Thresholds ==
/// Sliding window length in milliseconds.
pub const ACCESS_WINDOW_MS: u64 = 60 * 60 * 1000;

/// A key becomes hot once its window holds more than this many accesses.
pub const HOT_PROMOTE_THRESHOLD: usize = 10;

/// A hot key is demoted once its window falls below this many accesses.
pub const HOT_DEMOTE_THRESHOLD: usize = 5;

/// Seconds between periodic tracker sweeps.
pub const SWEEP_INTERVAL_SECONDS: u64 = 300;

// == Access Tracker ==
/// Per-key access instants within the sliding window, plus the hot set.
#[derive(Debug, Default)]
pub struct AccessTracker {
    windows: HashMap<String, VecDeque<u64>>,
    hot: HashSet<String>,
}

impl AccessTracker {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Access ==
    /// Records a read hit for `key` at `now_ms` and re-evaluates its
    /// hot/cold status.
    pub fn record_access(&mut self, key: &str, now_ms: u64) {
        let window = self.windows.entry(key.to_string()).or_default();
        window.push_back(now_ms);
        prune_window(window, now_ms);

        let count = window.len();
        if count > HOT_PROMOTE_THRESHOLD {
            self.hot.insert(key.to_string());
        } else if count < HOT_DEMOTE_THRESHOLD {
            self.hot.remove(key);
        }
    }

    // == Sweep ==
    /// Prunes every window, drops dead ones, re-evaluates hot/cold status
    /// for all tracked keys, and returns the resulting hot set.
    pub fn sweep(&mut self, now_ms: u64) -> Vec<String> {
        self.windows.retain(|key, window| {
            prune_window(window, now_ms);
            let count = window.len();

            if count > HOT_PROMOTE_THRESHOLD {
                self.hot.insert(key.clone());
            } else if count < HOT_DEMOTE_THRESHOLD {
                self.hot.remove(key);
            }

            !window.is_empty()
        });

        self.hot_keys()
    }

    // == Hot Keys ==
    /// Returns the currently hot keys, sorted for deterministic output.
    pub fn hot_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.hot.iter().cloned().collect();
        keys.sort();
        keys
    }

    // == Forget ==
    /// Drops all tracking state for `key`.
    pub fn forget(&mut self, key: &str) {
        self.windows.remove(key);
        self.hot.remove(key);
    }

    // == Clear ==
    /// Discards every window and the hot set.
    pub fn clear(&mut self) {
        self.windows.clear();
        self.hot.clear();
    }
}

fn prune_window(window: &mut VecDeque<u64>, now_ms: u64) {
    let cutoff = now_ms.saturating_sub(ACCESS_WINDOW_MS);
    while let Some(&oldest) = window.front() {
        if oldest < cutoff {
            window.pop_front();
        } else {
            break;
        }
    }
}
