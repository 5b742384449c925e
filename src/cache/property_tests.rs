//! Property-Based Tests for the Cache Layer
//!
//! Uses proptest to verify the engine's correctness properties against
//! arbitrary operation sequences.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::cache::{CacheEntry, CacheLayer, Lookup};
use crate::config::{EvictionStrategy, LayerConfig};
use crate::events::EventBus;

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 50;
const TEST_MAX_SIZE_BYTES: usize = 4096;

fn test_layer(strategy: EvictionStrategy) -> CacheLayer {
    CacheLayer::new(
        "prop",
        LayerConfig {
            max_entries: TEST_MAX_ENTRIES,
            max_size_bytes: TEST_MAX_SIZE_BYTES,
            strategy,
            ..Default::default()
        },
    )
}

fn entry(key: &str, value: &str, tags: &[String]) -> CacheEntry {
    CacheEntry::new(
        key.to_string(),
        value.as_bytes().to_vec(),
        None,
        3_600_000,
        tags.iter().cloned().collect(),
        HashMap::new(),
    )
}

// == Strategies ==
/// Generates valid cache keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}"
}

/// Generates values small enough to always fit the byte budget
fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,64}"
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Hit/miss counters and the derived ratio track the actual outcomes
    // of an arbitrary operation sequence.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let events = EventBus::new();
        let mut layer = test_layer(EvictionStrategy::Lru);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    layer.insert(entry(&key, &value, &[]), &events).unwrap();
                }
                CacheOp::Get { key } => match layer.lookup(&key, true, &events) {
                    Lookup::Hit(..) => expected_hits += 1,
                    Lookup::Miss | Lookup::Expired => expected_misses += 1,
                },
                CacheOp::Delete { key } => {
                    layer.remove(&key, &events);
                }
            }
        }

        let stats = layer.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.entry_count, layer.len(), "Entry count mismatch");

        let total = expected_hits + expected_misses;
        if total > 0 {
            let expected_ratio = expected_hits as f64 / total as f64;
            prop_assert!((stats.hit_ratio - expected_ratio).abs() < 1e-9);
        }
    }

    // Storing a pair and reading it back before expiry returns the
    // exact bytes that were stored.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy()) {
        let events = EventBus::new();
        let mut layer = test_layer(EvictionStrategy::Lru);

        layer.insert(entry(&key, &value, &[]), &events).unwrap();

        match layer.lookup(&key, true, &events) {
            Lookup::Hit(bytes, _) => prop_assert_eq!(bytes, value.into_bytes()),
            other => prop_assert!(false, "expected hit, got {:?}", other),
        }
    }

    // Storing V1 then V2 under the same key yields V2 and one entry.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy()
    ) {
        let events = EventBus::new();
        let mut layer = test_layer(EvictionStrategy::Lru);

        layer.insert(entry(&key, &value1, &[]), &events).unwrap();
        layer.insert(entry(&key, &value2, &[]), &events).unwrap();

        match layer.lookup(&key, true, &events) {
            Lookup::Hit(bytes, _) => prop_assert_eq!(bytes, value2.into_bytes()),
            other => prop_assert!(false, "expected hit, got {:?}", other),
        }
        prop_assert_eq!(layer.len(), 1);
    }

    // After any sequence of sets, both capacity budgets hold.
    #[test]
    fn prop_capacity_enforcement(
        pairs in prop::collection::vec((key_strategy(), value_strategy()), 1..150),
        strategy in prop_oneof![
            Just(EvictionStrategy::Lru),
            Just(EvictionStrategy::Lfu),
            Just(EvictionStrategy::Fifo),
            Just(EvictionStrategy::Random),
        ]
    ) {
        let events = EventBus::new();
        let mut layer = test_layer(strategy);

        for (key, value) in pairs {
            layer.insert(entry(&key, &value, &[]), &events).unwrap();

            let stats = layer.stats();
            prop_assert!(stats.entry_count <= TEST_MAX_ENTRIES);
            prop_assert!(stats.size_bytes <= TEST_MAX_SIZE_BYTES);
        }
    }

    // Tag invalidation removes exactly the tagged entries and reports
    // exactly that count.
    #[test]
    fn prop_tag_invalidation_exact(
        tagged in prop::collection::hash_set(key_strategy(), 0..10),
        untagged in prop::collection::hash_set(key_strategy(), 0..10),
    ) {
        let events = EventBus::new();
        let mut layer = test_layer(EvictionStrategy::Lru);
        let tag = vec!["group".to_string()];

        let untagged: HashSet<String> = untagged.difference(&tagged).cloned().collect();
        for key in &tagged {
            layer.insert(entry(key, "v", &tag), &events).unwrap();
        }
        for key in &untagged {
            layer.insert(entry(key, "v", &[]), &events).unwrap();
        }

        let removed = layer.invalidate_by_tag("group", &events);

        prop_assert_eq!(removed, tagged.len());
        for key in &tagged {
            prop_assert!(matches!(layer.lookup(key, false, &events), Lookup::Miss));
        }
        for key in &untagged {
            prop_assert!(matches!(layer.lookup(key, false, &events), Lookup::Hit(..)));
        }
    }

    // A deleted key is gone on the next lookup.
    #[test]
    fn prop_delete_removes_entry(key in key_strategy(), value in value_strategy()) {
        let events = EventBus::new();
        let mut layer = test_layer(EvictionStrategy::Lru);

        layer.insert(entry(&key, &value, &[]), &events).unwrap();
        prop_assert!(layer.remove(&key, &events));
        prop_assert!(matches!(layer.lookup(&key, true, &events), Lookup::Miss));
    }
}
