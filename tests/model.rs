//! Randomized insert/erase sequences checked step by step against
//! `std::collections::BTreeMap` as the reference model.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rbmap::RBTreeMap;
use std::collections::BTreeMap;

const OPS: usize = 2_000;
const KEY_SPACE: u64 = 256;

fn check_against_model(map: &RBTreeMap<u64, u64>, model: &BTreeMap<u64, u64>) {
    assert!(map.is_balanced());
    assert_eq!(map.len(), model.len());
    let entries: Vec<(u64, u64)> = map.iter().map(|(k, v)| (*k, *v)).collect();
    let expected: Vec<(u64, u64)> = model.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(entries, expected);
    // in-order keys are strictly increasing with no duplicates
    for window in entries.windows(2) {
        assert!(window[0].0 < window[1].0);
    }
}

fn run(seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut map = RBTreeMap::new();
    let mut model = BTreeMap::new();

    for step in 0..OPS {
        let key = rng.gen_range(0..KEY_SPACE);
        if rng.gen_bool(0.6) {
            let value = rng.gen::<u64>();
            let inserted = map.insert(key, value);
            // the model mirrors first-insert-wins
            let model_inserted = !model.contains_key(&key);
            if model_inserted {
                model.insert(key, value);
            }
            assert_eq!(inserted, model_inserted, "insert({}) at step {}", key, step);
        } else {
            let erased = map.erase(&key);
            assert_eq!(erased, model.remove(&key).is_some(), "erase({}) at step {}", key, step);
        }
        assert_eq!(map.contains_key(&key), model.contains_key(&key));
        if step % 64 == 0 {
            check_against_model(&map, &model);
        }
    }
    check_against_model(&map, &model);

    for key in 0..KEY_SPACE {
        assert_eq!(map.get(&key).ok(), model.get(&key));
    }

    // drain in random order
    let mut keys: Vec<u64> = model.keys().copied().collect();
    while !keys.is_empty() {
        let idx = rng.gen_range(0..keys.len());
        let key = keys.swap_remove(idx);
        assert!(map.erase(&key));
        model.remove(&key);
        assert!(map.is_balanced());
    }
    assert!(map.is_empty());
}

#[test]
fn random_ops_match_reference_model() {
    for seed in 0..8 {
        run(seed);
    }
}

#[test]
fn clone_snapshot_matches_model() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut map = RBTreeMap::new();
    let mut model = BTreeMap::new();
    for _ in 0..512 {
        let key = rng.gen_range(0..KEY_SPACE);
        let value = rng.gen::<u64>();
        if map.insert(key, value) {
            model.insert(key, value);
        }
    }

    let snapshot = map.clone();
    // mutating the original must not show through the snapshot
    for key in 0..KEY_SPACE {
        map.erase(&key);
    }
    assert!(map.is_empty());
    check_against_model(&snapshot, &model);
}
