//! Top-level table construction.
//!
//! Validates the input, picks a strategy, runs the search or the split, and
//! hands back a built map. All input problems surface before any search
//! time is spent.

use crate::classify::Classification;
use crate::error::Error;
use crate::family::PhfKey;
use crate::search::{find_coefficients, Progress, SearchBounds};
use crate::split::{split, SplitConfig};
use crate::table::{build_single_level, build_two_level, BuiltMap};
use core::sync::atomic::{AtomicBool, Ordering};
use std::collections::HashMap;

/// Key counts above this skip the coefficient search under
/// [`Strategy::Auto`].
///
/// The single-level family rarely separates larger sets within the default
/// bounds, and an exhausted search costs far more than a split.
pub const SINGLE_LEVEL_KEY_CEILING: usize = 64;

/// Which construction paths a build may take.
#[expect(clippy::exhaustive_enums, reason = "mirrors the two construction paths")]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Coefficient search for small sets, two-level fallback otherwise.
    #[default]
    Auto,
    /// Coefficient search only; fail instead of falling back.
    SingleLevelOnly,
    /// Two-level scheme directly, skipping the coefficient search.
    TwoLevel,
}

/// Tuning knobs of a build.
#[expect(clippy::exhaustive_structs, reason = "plain configuration, constructed by struct literal")]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildConfig {
    /// Empty slots the dense classifications may leave in the table.
    pub acceptable_empties: u64,

    /// Bounds of the coefficient enumeration.
    pub bounds: SearchBounds,

    /// Tuning of the two-level fallback.
    pub split: SplitConfig,

    /// Construction paths to consider.
    pub strategy: Strategy,
}

/// The earliest pair of equal keys, as `(first, second)` indices.
fn find_duplicate<K: PhfKey>(keys: &[K]) -> Option<(usize, usize)> {
    let mut seen: HashMap<&K, usize> = HashMap::with_capacity(keys.len());
    for (index, key) in keys.iter().enumerate() {
        if let Some(&first) = seen.get(key) {
            return Some((first, index));
        }
        seen.insert(key, index);
    }
    None
}

/// Build a static map from parallel key and value slices.
///
/// Every produced map satisfies the round-trip guarantee: each input key
/// looks up its own value, and keys outside the set fall through to
/// `default_value`. Raising `cancel` stops the work at the next poll; a
/// cancelled build that has not yet found a usable hash fails with
/// [`Error::Cancelled`].
pub fn build<K: PhfKey, V>(
    keys: Vec<K>,
    values: Vec<V>,
    default_value: V,
    config: &BuildConfig,
    cancel: &AtomicBool,
    progress: &mut dyn Progress,
) -> Result<BuiltMap<K, V>, Error> {
    if keys.len() != values.len() {
        return Err(Error::MismatchedKeyValueCounts { keys: keys.len(), values: values.len() });
    }
    if keys.len() < 2 {
        return Err(Error::TooFewKeys(keys.len()));
    }
    if let Some((first, second)) = find_duplicate(&keys) {
        return Err(Error::DuplicateKey { first, second });
    }

    let try_single_level = match config.strategy {
        Strategy::SingleLevelOnly => true,
        Strategy::TwoLevel => false,
        Strategy::Auto => keys.len() <= SINGLE_LEVEL_KEY_CEILING,
    };

    if try_single_level {
        let outcome =
            find_coefficients(&keys, config.acceptable_empties, config.bounds, cancel, progress);
        if outcome.classification > Classification::Collision {
            return Ok(build_single_level(keys, values, default_value, &outcome));
        }
        if cancel.load(Ordering::Relaxed) {
            return Err(Error::Cancelled);
        }
        if config.strategy == Strategy::SingleLevelOnly {
            return Err(Error::NoCollisionFreeFunction);
        }
    }

    if cancel.load(Ordering::Relaxed) {
        return Err(Error::Cancelled);
    }
    match split(&keys, &config.split) {
        Some(phf) => Ok(build_two_level(keys, values, default_value, phf)),
        None => Err(Error::NoCollisionFreeFunction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SilentProgress;
    use crate::table::LookupFn;

    fn unforced() -> (BuildConfig, AtomicBool) {
        (BuildConfig::default(), AtomicBool::new(false))
    }

    #[test]
    fn mismatched_counts_are_rejected() {
        let (config, cancel) = unforced();
        let result = build(vec!["a", "b"], vec![1], 0, &config, &cancel, &mut SilentProgress);
        assert_eq!(result.unwrap_err(), Error::MismatchedKeyValueCounts { keys: 2, values: 1 });
    }

    #[test]
    fn singleton_inputs_are_rejected() {
        let (config, cancel) = unforced();
        let result = build(vec!["a"], vec![1], 0, &config, &cancel, &mut SilentProgress);
        assert_eq!(result.unwrap_err(), Error::TooFewKeys(1));
    }

    #[test]
    fn duplicates_are_reported_with_both_indices() {
        let (config, cancel) = unforced();
        let result =
            build(vec!["a", "b", "a"], vec![1, 2, 3], 0, &config, &cancel, &mut SilentProgress);
        assert_eq!(result.unwrap_err(), Error::DuplicateKey { first: 0, second: 2 });
    }

    #[test]
    fn small_sets_build_single_level() {
        let (config, cancel) = unforced();
        let map = build(
            vec![7_u8, 8, 9],
            vec!["seven", "eight", "nine"],
            "?",
            &config,
            &cancel,
            &mut SilentProgress,
        )
        .unwrap();
        assert!(matches!(map.lookup_fn(), LookupFn::SingleLevel { .. }));
        assert_eq!(map.lookup(&8), &"eight");
        assert_eq!(map.lookup(&77), &"?");
    }

    #[test]
    fn forced_two_level_skips_the_search() {
        let cancel = AtomicBool::new(false);
        let config = BuildConfig { strategy: Strategy::TwoLevel, ..BuildConfig::default() };
        let map = build(
            vec![7_u8, 8, 9],
            vec!["seven", "eight", "nine"],
            "?",
            &config,
            &cancel,
            &mut SilentProgress,
        )
        .unwrap();
        assert!(matches!(map.lookup_fn(), LookupFn::TwoLevel(_)));
        assert_eq!(map.lookup(&9), &"nine");
    }

    #[test]
    fn large_sets_bypass_the_search_automatically() {
        let (config, cancel) = unforced();
        let keys: Vec<u32> = (0..(SINGLE_LEVEL_KEY_CEILING as u32) + 36).collect();
        let values: Vec<u32> = keys.iter().map(|key| key * 10).collect();
        let map = build(keys, values, 0, &config, &cancel, &mut SilentProgress).unwrap();
        assert!(matches!(map.lookup_fn(), LookupFn::TwoLevel(_)));
        assert_eq!(map.lookup(&5), &50);
    }

    #[test]
    fn pre_cancelled_single_level_builds_fail_with_cancelled() {
        let cancel = AtomicBool::new(true);
        let config = BuildConfig { strategy: Strategy::SingleLevelOnly, ..BuildConfig::default() };
        let result =
            build(vec![1_u8, 2, 3], vec!["a", "b", "c"], "?", &config, &cancel, &mut SilentProgress);
        assert_eq!(result.unwrap_err(), Error::Cancelled);
    }

    #[test]
    fn pre_cancelled_two_level_builds_fail_with_cancelled() {
        let cancel = AtomicBool::new(true);
        let config = BuildConfig { strategy: Strategy::TwoLevel, ..BuildConfig::default() };
        let result =
            build(vec![1_u8, 2, 3], vec!["a", "b", "c"], "?", &config, &cancel, &mut SilentProgress);
        assert_eq!(result.unwrap_err(), Error::Cancelled);
    }
}
