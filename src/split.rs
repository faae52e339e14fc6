//! The two-level fallback scheme.
//!
//! When the coefficient search is unproductive, keys are split into bins by a
//! seeded first-level hash, and each bin gets its own second-level seed
//! placing its keys into a shared final table. Both levels mask the hash by a
//! power of two, so the generated lookup needs two hashes and two masks and
//! no division.

#![expect(
    clippy::arithmetic_side_effects,
    reason = "bin counts and table lengths derive from masks fixed at entry"
)]

use crate::bitset::BitSet;
use crate::family::PhfKey;
use rapidhash::RapidRng;

/// First-level seed candidates: zero, one and the first thirty primes.
const FIRST_LEVEL_SEEDS: [u16; 32] = [
    0, 1, 2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83,
    89, 97, 101, 103, 107, 109, 113,
];

/// Tuning knobs of the split.
#[expect(clippy::exhaustive_structs, reason = "plain configuration, constructed by struct literal")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitConfig {
    /// Numerator of the bin count scale. More bins, fewer keys per bin.
    pub expansion: u8,

    /// Denominator of the bin count scale. Fewer bins, smaller seed table.
    pub reduction: u8,

    /// Bins at or above this size reject the first-level seed outright
    /// instead of entering the per-bin seed search.
    pub max_bin_size: usize,

    /// How many pseudo-random first-level seed candidates to append to the
    /// fixed schedule before giving up.
    pub extra_first_level_seeds: u16,
}

impl Default for SplitConfig {
    #[inline]
    fn default() -> Self {
        Self {
            expansion: 1,
            reduction: 1,
            max_bin_size: 10,
            extra_first_level_seeds: 0,
        }
    }
}

/// The smallest power-of-two mask whose slot count reaches `size`.
///
/// Never below 1: a degenerate request still yields a two-slot table.
pub(crate) fn power_of_two_mask(size: usize) -> u32 {
    #[expect(clippy::cast_possible_truncation, reason = "two-level tables are indexed by u32 hashes")]
    let mask = (size.next_power_of_two().max(2) - 1) as u32;
    mask
}

/// The first-level seed candidates, in trial order.
fn seed_schedule(extra: u16) -> impl Iterator<Item = u16> {
    // Hexadecimal digits of pi - 3
    let mut rng = RapidRng::new(0x243f_6a88_85a3_08d3);
    FIRST_LEVEL_SEEDS.into_iter().chain(
        core::iter::repeat_with(move || {
            #[expect(clippy::cast_possible_truncation, reason = "seeds are 16-bit by contract")]
            let seed = rng.next() as u16;
            seed
        })
        .take(usize::from(extra)),
    )
}

/// One first-level bin during seed assignment.
struct Bin {
    /// The first-level hash value generating this bin. Indexes the seed
    /// table.
    first_hash: u32,

    /// The second-level seed, once found.
    seed: u16,

    /// Indices into the caller's key slice.
    members: Vec<usize>,
}

/// A complete two-level hash: both seed levels and both masks.
///
/// `slot_of` is total over the key type; only the construction guarantees
/// that the stored keys land in distinct slots.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TwoLevelPhf {
    /// First-level seed, splitting keys into bins.
    seed0: u16,
    /// Mask applied to the first-level hash.
    first_mask: u32,
    /// Mask applied to the second-level hash.
    second_mask: u32,
    /// Second-level seed per first-level hash value.
    bin_seeds: Vec<u16>,
}

impl TwoLevelPhf {
    /// Initialize from saved data.
    ///
    /// Meant for codegen, not for public use.
    #[doc(hidden)]
    #[inline]
    #[must_use]
    pub fn __from_raw_parts(seed0: u16, first_mask: u32, second_mask: u32, bin_seeds: Vec<u16>) -> Self {
        Self { seed0, first_mask, second_mask, bin_seeds }
    }

    /// The final table slot of a key.
    #[inline]
    #[must_use]
    pub fn slot_of<K: PhfKey>(&self, key: &K) -> usize {
        let first = (key.seeded_hash(self.seed0) & self.first_mask) as usize;
        let bin_seed = self.bin_seeds[first];
        (key.seeded_hash(bin_seed) & self.second_mask) as usize
    }

    /// The final table length, `second_mask + 1`.
    #[inline]
    #[must_use]
    pub const fn table_len(&self) -> usize {
        self.second_mask as usize + 1
    }

    /// The first-level seed.
    #[inline]
    #[must_use]
    pub const fn seed0(&self) -> u16 {
        self.seed0
    }

    /// The first-level mask. The seed table has `first_mask + 1` entries.
    #[inline]
    #[must_use]
    pub const fn first_mask(&self) -> u32 {
        self.first_mask
    }

    /// The second-level mask.
    #[inline]
    #[must_use]
    pub const fn second_mask(&self) -> u32 {
        self.second_mask
    }

    /// The second-level seed table, indexed by masked first-level hash.
    #[inline]
    #[must_use]
    pub fn bin_seeds(&self) -> &[u16] {
        &self.bin_seeds
    }
}

/// Find a second-level seed placing every member of `bin` into a free slot.
///
/// Provisional slots are rolled back whenever a seed fails, so `occupancy`
/// only ever accumulates the slots of completed bins.
fn find_bin_seed<K: PhfKey>(
    keys: &[K],
    bin: &mut Bin,
    second_mask: u32,
    occupancy: &mut BitSet,
) -> bool {
    'seeds: for seed in 0..u16::MAX {
        let mut placed = 0;
        for &member in &bin.members {
            let slot = (keys[member].seeded_hash(seed) & second_mask) as usize;
            if !occupancy.insert(slot) {
                for &undo in &bin.members[..placed] {
                    occupancy.remove((keys[undo].seeded_hash(seed) & second_mask) as usize);
                }
                continue 'seeds;
            }
            placed += 1;
        }
        bin.seed = seed;
        return true;
    }
    false
}

/// Try one first-level seed end to end.
///
/// Bins are seeded largest-first: big bins have the fewest free slots to
/// choose from, so they go while the table is emptiest. The sort is stable
/// and ties keep first-hash order, which keeps the whole construction
/// deterministic.
fn try_first_seed<K: PhfKey>(
    keys: &[K],
    seed0: u16,
    first_mask: u32,
    second_mask: u32,
    max_bin_size: usize,
) -> Option<Vec<u16>> {
    let bin_count = first_mask as usize + 1;
    let mut bins: Vec<Bin> = (0..bin_count)
        .map(|first_hash| {
            #[expect(clippy::cast_possible_truncation, reason = "bin indices are masked u32 hashes")]
            let first_hash = first_hash as u32;
            Bin { first_hash, seed: 0, members: Vec::new() }
        })
        .collect();

    for (index, key) in keys.iter().enumerate() {
        let first = (key.seeded_hash(seed0) & first_mask) as usize;
        bins[first].members.push(index);
    }

    bins.sort_by(|a, b| b.members.len().cmp(&a.members.len()));
    if bins[0].members.len() >= max_bin_size {
        return None;
    }

    let mut occupancy = BitSet::new_zeroes(second_mask as usize + 1);
    for bin in &mut bins {
        if !find_bin_seed(keys, bin, second_mask, &mut occupancy) {
            return None;
        }
    }

    let mut bin_seeds = vec![0_u16; bin_count];
    for bin in &bins {
        bin_seeds[bin.first_hash as usize] = bin.seed;
    }
    Some(bin_seeds)
}

/// Split the keys into a two-level hash.
///
/// Walks the first-level seed schedule until one seed admits a full
/// assignment of second-level seeds. Returns `None` when the whole schedule
/// is exhausted.
pub fn split<K: PhfKey>(keys: &[K], config: &SplitConfig) -> Option<TwoLevelPhf> {
    let scaled =
        keys.len() * usize::from(config.expansion) / usize::from(config.reduction.max(1));
    let first_mask = power_of_two_mask(scaled);
    let second_mask = power_of_two_mask(keys.len());

    for seed0 in seed_schedule(config.extra_first_level_seeds) {
        if let Some(bin_seeds) =
            try_first_seed(keys, seed0, first_mask, second_mask, config.max_bin_size)
        {
            return Some(TwoLevelPhf { seed0, first_mask, second_mask, bin_seeds });
        }
    }

    None
}

#[cfg(feature = "codegen")]
impl crate::codegen::Codegen for TwoLevelPhf {
    #[inline]
    fn generate_piece(&self, gen: &mut crate::codegen::CodeGenerator) -> proc_macro2::TokenStream {
        let krate = gen.krate();
        let seed0 = self.seed0;
        let first_mask = self.first_mask;
        let second_mask = self.second_mask;
        let bin_seeds = gen.piece(&self.bin_seeds);
        quote::quote!(#krate::TwoLevelPhf::__from_raw_parts(
            #seed0, #first_mask, #second_mask, #bin_seeds,
        ))
    }
}
