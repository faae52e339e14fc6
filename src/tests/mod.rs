//! End-to-end construction scenarios.

use crate::{
    build, find_coefficients, BuildConfig, BuiltMap, Classification, Layout, LookupFn, PhfKey,
    SearchBounds, SilentProgress, SplitConfig, Strategy,
};
use core::sync::atomic::AtomicBool;
use rapidhash::RapidRng;
use std::collections::HashSet;

/// Bounds small enough for tests that exhaust a width.
const TINY: SearchBounds = SearchBounds { scale: 4, add: 6, shift_per_byte: 1 };

fn build_with<K: PhfKey, V>(
    keys: Vec<K>,
    values: Vec<V>,
    default_value: V,
    config: &BuildConfig,
) -> BuiltMap<K, V> {
    build(keys, values, default_value, config, &AtomicBool::new(false), &mut SilentProgress)
        .unwrap()
}

fn random_words(count: usize) -> Vec<String> {
    let mut rng = RapidRng::new(0x439f_2674_4da7_67e5);
    (0..count).map(|_| format!("word-{:012x}", rng.next() & 0xffff_ffff_ffff)).collect()
}

#[test]
fn greek_letter_scenario() {
    let map = build_with(
        vec!["pi", "mu", "xi"],
        vec!["π", "μ", "ξ"],
        "?",
        &BuildConfig::default(),
    );
    assert!(matches!(map.lookup_fn(), LookupFn::SingleLevel { .. }));
    assert_eq!(map.lookup(&"pi"), &"π");
    assert_eq!(map.lookup(&"mu"), &"μ");
    assert_eq!(map.lookup(&"xi"), &"ξ");
    assert_eq!(map.lookup(&"nu"), &"?", "absent keys fall through to the default");
    assert_eq!(map.get(&"nu"), None);
}

#[test]
fn symbol_table_scenario() {
    // 130 single-character keys from the Mathematical Operators block.
    let keys: Vec<String> = (0x2200..0x2282_u32)
        .filter_map(char::from_u32)
        .map(String::from)
        .collect();
    assert_eq!(keys.len(), 130);
    let values: Vec<u32> = (0..130_u32).collect();
    let config = BuildConfig {
        strategy: Strategy::TwoLevel,
        split: SplitConfig { expansion: 1, reduction: 6, ..SplitConfig::default() },
        ..BuildConfig::default()
    };
    let map = build_with(keys.clone(), values, u32::MAX, &config);

    let LookupFn::TwoLevel(phf) = map.lookup_fn() else {
        panic!("the forced strategy must build a two-level map");
    };
    assert_eq!(
        phf.bin_seeds().len() as u32,
        phf.first_mask() + 1,
        "the seed table covers every first-level hash value"
    );
    assert_eq!(phf.bin_seeds().len(), 32, "130 keys reduced by 6 give 32 bins");

    let slots: HashSet<usize> = keys.iter().map(|key| phf.slot_of(key)).collect();
    assert_eq!(slots.len(), keys.len(), "final slots must be pairwise disjoint");

    for (i, key) in keys.iter().enumerate() {
        assert_eq!(map.lookup(key), &(i as u32), "key {key:?} must round-trip");
    }
    assert_eq!(map.lookup(&String::from('⊂')), &u32::MAX, "a symbol outside the set falls through");
}

#[test]
fn builds_are_bit_identical() {
    let keys = random_words(40);
    let values: Vec<usize> = (0..keys.len()).collect();
    let config = BuildConfig { bounds: TINY, ..BuildConfig::default() };
    let first = build_with(keys.clone(), values.clone(), usize::MAX, &config);
    let second = build_with(keys, values, usize::MAX, &config);
    assert_eq!(first, second, "identical inputs must build identical tables");
}

#[test]
fn dense_outcomes_respect_the_budget() {
    // Bounds admitting only the zero vector and the single-byte identity
    // `c0 == 1`, so the search outcome is exactly the identity's
    // classification of the key bytes.
    let identity_only = SearchBounds { scale: 1, add: 2, shift_per_byte: 1 };
    let cancel = AtomicBool::new(false);

    // Hashes 1, 2, 3, 5: span waste 1, but 1 and 5 clash mod 4.
    let outcome =
        find_coefficients(&[1_u8, 2, 3, 5], 1, identity_only, &cancel, &mut SilentProgress);
    assert_eq!(outcome.classification, Classification::DenseByOffset);
    assert_eq!(outcome.wasted_slots, 1, "span waste must stay within the budget");
    assert_eq!(outcome.min_hash, 1);

    // Hashes 0, 5, 11: clash mod 3 and span too far, but distinct mod 4.
    let outcome =
        find_coefficients(&[0_u8, 5, 11], 1, identity_only, &cancel, &mut SilentProgress);
    assert_eq!(outcome.classification, Classification::DenseByModulus);
    assert!(outcome.wasted_slots > 0, "dense outcomes waste at least one slot");
    assert!(outcome.wasted_slots <= 1, "waste must stay within the budget");

    // A zero budget forbids both dense forms.
    let outcome =
        find_coefficients(&[0_u8, 5, 11], 0, identity_only, &cancel, &mut SilentProgress);
    assert_eq!(outcome.classification, Classification::Perfect);
}

#[test]
fn minimal_outcomes_build_tables_without_waste() {
    let map =
        build_with(vec![7_u8, 8, 9], vec!["seven", "eight", "nine"], "?", &BuildConfig::default());
    let Layout::Dense(slots) = map.layout() else {
        panic!("a minimal outcome must build a dense layout");
    };
    assert_eq!(slots.len(), map.len(), "a minimal table has exactly one slot per key");
    assert!(slots.iter().all(Option::is_some), "a minimal table has no empty slots");
}

#[test]
fn integer_keys_round_trip() {
    let mut rng = RapidRng::new(0x439f_2674_4da7_67e5);
    let keys: Vec<u64> = (0..30).map(|_| rng.next()).collect();
    let values: Vec<String> = keys.iter().map(|key| format!("v{key:x}")).collect();
    let config = BuildConfig {
        bounds: SearchBounds { scale: 8, add: 16, shift_per_byte: 2 },
        ..BuildConfig::default()
    };
    let map = build_with(keys.clone(), values.clone(), String::from("missing"), &config);
    for (key, value) in keys.iter().zip(&values) {
        assert_eq!(map.lookup(key), value, "key {key:#x} must round-trip");
    }
    assert_eq!(map.lookup(&1), &String::from("missing"), "an absent integer key falls through");
}

#[test]
fn every_map_entry_resolves_to_its_own_slot() {
    let keys = random_words(25);
    let values: Vec<usize> = (0..keys.len()).collect();
    let config = BuildConfig { bounds: TINY, ..BuildConfig::default() };
    let map = build_with(keys, values, usize::MAX, &config);
    assert_eq!(map.entries().count(), map.len());
    for (key, value) in map.entries() {
        assert_eq!(map.get(key), Some(value), "entry {key:?} must resolve to itself");
    }
}

#[cfg(feature = "codegen")]
#[test]
fn generated_code_calls_the_raw_constructors() {
    let map = build_with(vec![7_u8, 8, 9], vec![1_u32, 2, 3], 0, &BuildConfig::default());
    let code = crate::codegen::CodeGenerator::new().generate(&map).to_string();
    assert!(code.contains("__from_raw_parts"), "codegen must use the hidden constructor: {code}");
    assert!(code.contains("phgen"), "codegen must name the crate: {code}");
}
