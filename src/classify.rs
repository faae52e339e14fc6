//! Classification of one coefficient choice over a key set.
//!
//! For a fixed coefficient vector, the hashes of all keys fall into exactly
//! one bucket of an ordered quality scale: they collide, or they are merely
//! distinct, or they compact into a table with bounded or zero waste. The
//! search keeps the best-classified vector it has seen.

#![expect(
    clippy::arithmetic_side_effects,
    reason = "span and waste arithmetic cannot overflow: hashes are distinct u64s and counts are key counts"
)]

use crate::bitset::BitSet;
use crate::family::{Coefficients, HashWord, PhfKey};
use std::collections::HashSet;

/// How the hashes of a key set behave under one coefficient choice.
///
/// Ordered worst to best. `*ByOffset` means the hash span equals
/// `keys.len() - 1 + wasted`, so the table is indexed by subtracting the
/// minimum hash; `*ByModulus` means the hashes are distinct modulo the table
/// length. `Dense*` tolerates a bounded number of empty slots, `Minimal*`
/// none. [`Perfect`](Self::Perfect) is the fallback when the hashes are
/// distinct but no compaction applies: the table must then be indexed by the
/// raw hash value.
#[expect(clippy::exhaustive_enums, reason = "the quality scale is closed")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Classification {
    /// At least two keys share a hash. No usable function.
    Collision,
    /// All hashes distinct over the full output range, no compaction found.
    Perfect,
    /// Distinct modulo `keys.len() + acceptable_empties`.
    DenseByModulus,
    /// Span fits in `keys.len() - 1 + wasted` with `wasted` within budget.
    DenseByOffset,
    /// Distinct modulo `keys.len()`. Zero waste.
    MinimalByModulus,
    /// Span is exactly `keys.len() - 1`. Zero waste, no modulus.
    MinimalByOffset,
}

impl Classification {
    /// A short status phrase for progress reporting.
    #[inline]
    #[must_use]
    pub const fn status_phrase(self) -> &'static str {
        match self {
            Self::Collision => "searching",
            Self::Perfect => "found collision-free hash",
            Self::DenseByModulus => "found dense hash (modulus)",
            Self::DenseByOffset => "found dense hash (offset)",
            Self::MinimalByModulus => "found minimal hash (modulus)",
            Self::MinimalByOffset => "found minimal hash (offset)",
        }
    }
}

/// The classification of one coefficient vector, with its cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Verdict {
    /// Where the vector lands on the quality scale.
    pub classification: Classification,

    /// Table slots no key occupies. Zero for `Minimal*`, within the caller's
    /// budget for `Dense*`, and the raw span waste for `Perfect` (where it
    /// only matters for tie-breaking).
    pub wasted_slots: u64,

    /// The smallest hash over all keys. Offset-indexed tables subtract it.
    pub min_hash: u64,
}

impl Verdict {
    /// The verdict for a colliding vector. Worst possible rank.
    pub(crate) const COLLISION: Self = Self {
        classification: Classification::Collision,
        wasted_slots: u64::MAX,
        min_hash: 0,
    };
}

/// Presence set over hash values, sized to the active width.
///
/// Narrow widths use a flat bit set indexed by the hash itself; wide ones
/// fall back to a hash set.
enum Presence {
    /// Bit per possible hash value. Only for widths of at most 16 bits.
    Narrow(BitSet),
    /// Arbitrary-width fallback.
    Wide(HashSet<u64>),
}

impl Presence {
    /// Record a hash, reporting whether it is new.
    fn insert(&mut self, hash: u64) -> bool {
        match self {
            #[expect(clippy::cast_possible_truncation, reason = "narrow hashes fit in usize")]
            Self::Narrow(bits) => bits.insert(hash as usize),
            Self::Wide(set) => set.insert(hash),
        }
    }

    /// Undo the recorded hashes. `hashes` must be exactly the set of values
    /// for which [`insert`](Self::insert) returned `true`.
    fn forget(&mut self, hashes: &[u64]) {
        match self {
            Self::Narrow(bits) => {
                for &hash in hashes {
                    #[expect(clippy::cast_possible_truncation, reason = "narrow hashes fit in usize")]
                    bits.remove(hash as usize);
                }
            }
            Self::Wide(set) => set.clear(),
        }
    }
}

/// Reusable buffers for one width of the search.
///
/// The classifier runs tens of millions of times per search; allocating its
/// working state per call would dominate the runtime. The search threads one
/// of these through every call instead.
pub(crate) struct Scratch {
    /// Hashes of the keys, in key order. Emptied on reset.
    hashes: Vec<u64>,

    /// Presence set for exact-collision detection.
    presence: Presence,

    /// Occupancy bits for the modulus injectivity tests. Always left clean.
    slots: BitSet,
}

impl Scratch {
    /// Allocate buffers for `key_count` keys at a `bits`-wide output, with up
    /// to `acceptable_empties` wasted slots.
    pub(crate) fn new(bits: u32, key_count: usize, acceptable_empties: u64) -> Self {
        let presence = if bits <= 16 {
            Presence::Narrow(BitSet::new_zeroes(1 << bits))
        } else {
            Presence::Wide(HashSet::with_capacity(key_count))
        };
        let empties = usize::try_from(acceptable_empties).unwrap_or(usize::MAX);
        Self {
            hashes: Vec::with_capacity(key_count),
            presence,
            slots: BitSet::new_zeroes(key_count.saturating_add(empties)),
        }
    }

    /// Drop the previous call's state.
    fn reset(&mut self) {
        self.presence.forget(&self.hashes);
        self.hashes.clear();
    }
}

/// Check whether the hashes stay distinct modulo `divisor`.
///
/// Leaves `slots` clean regardless of the answer.
fn injective_modulo(hashes: &[u64], divisor: u64, slots: &mut BitSet) -> bool {
    let mut inserted = 0;
    let mut injective = true;
    for &hash in hashes {
        #[expect(clippy::cast_possible_truncation, reason = "divisor is bounded by the table size")]
        if !slots.insert((hash % divisor) as usize) {
            injective = false;
            break;
        }
        inserted += 1;
    }
    for &hash in &hashes[..inserted] {
        #[expect(clippy::cast_possible_truncation, reason = "divisor is bounded by the table size")]
        slots.remove((hash % divisor) as usize);
    }
    injective
}

/// Classify one coefficient vector over the key set.
///
/// Computes every key's hash at width `W` and walks the quality scale top
/// down: exact collision, offset-minimal, modulus-minimal, offset-dense,
/// modulus-dense, and finally the uncompacted [`Classification::Perfect`].
///
/// Offset compaction needs no injectivity re-check: the raw hashes are
/// already distinct, and subtracting the minimum preserves distinctness.
pub(crate) fn classify<W: HashWord, K: PhfKey>(
    keys: &[K],
    coefficients: &Coefficients,
    acceptable_empties: u64,
    scratch: &mut Scratch,
) -> Verdict {
    scratch.reset();

    for key in keys {
        let hash = key.coefficient_hash::<W>(coefficients).widen();
        if !scratch.presence.insert(hash) {
            return Verdict::COLLISION;
        }
        scratch.hashes.push(hash);
    }

    let count = keys.len() as u64;
    let min_hash = *scratch.hashes.iter().min().unwrap_or(&0);
    let max_hash = *scratch.hashes.iter().max().unwrap_or(&0);
    let wasted_by_offset = (max_hash - min_hash) - (count - 1);

    if wasted_by_offset == 0 {
        return Verdict {
            classification: Classification::MinimalByOffset,
            wasted_slots: 0,
            min_hash,
        };
    }

    if injective_modulo(&scratch.hashes, count, &mut scratch.slots) {
        return Verdict {
            classification: Classification::MinimalByModulus,
            wasted_slots: 0,
            min_hash,
        };
    }

    if wasted_by_offset <= acceptable_empties {
        return Verdict {
            classification: Classification::DenseByOffset,
            wasted_slots: wasted_by_offset,
            min_hash,
        };
    }

    // With a zero budget the dense divisor equals the key count, which was
    // rejected just above.
    if acceptable_empties != 0
        && injective_modulo(&scratch.hashes, count + acceptable_empties, &mut scratch.slots)
    {
        return Verdict {
            classification: Classification::DenseByModulus,
            wasted_slots: acceptable_empties,
            min_hash,
        };
    }

    Verdict {
        classification: Classification::Perfect,
        wasted_slots: wasted_by_offset,
        min_hash,
    }
}
