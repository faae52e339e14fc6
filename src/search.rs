//! Exhaustive search over the coefficient space.
//!
//! The search enumerates every coefficient vector within fixed bounds, in a
//! fixed nesting order, classifying each one and keeping the best. It starts
//! at the narrowest accumulator width that can index the table and widens
//! only after exhausting a width without finding a collision-free vector.
//! Same keys, same bounds, same outcome, always.

#![expect(
    clippy::arithmetic_side_effects,
    reason = "percentage arithmetic runs only inside loops whose bounds it divides by"
)]

use crate::classify::{classify, Classification, Scratch, Verdict};
use crate::family::{Coefficients, HashWord, PhfKey, Width};
use core::sync::atomic::{AtomicBool, Ordering};

/// Exclusive bounds of the coefficient enumeration.
///
/// The defaults are the productive region of the space; larger bounds mostly
/// revisit equivalent vectors. Tests shrink them to keep runs short.
#[expect(clippy::exhaustive_structs, reason = "plain bounds, constructed by struct literal")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchBounds {
    /// Bound for the scaling coefficients `c1`, `c2` and `c3`.
    pub scale: u8,

    /// Bound for the additive coefficient `c0`.
    pub add: u8,

    /// Shift bound per accumulator byte: `c4` and `c5` range below
    /// `shift_per_byte * width_bytes`, capped at the width itself.
    pub shift_per_byte: u8,
}

impl Default for SearchBounds {
    #[inline]
    fn default() -> Self {
        Self {
            scale: 34,
            add: 60,
            shift_per_byte: 6,
        }
    }
}

impl SearchBounds {
    /// The exclusive shift bound at a given width. At least 1, so the
    /// shift-disabled vectors are always enumerated.
    fn shift_bound(self, width: Width) -> u8 {
        #[expect(clippy::cast_possible_truncation, reason = "widths are at most 8 bytes")]
        let per_width = self.shift_per_byte.saturating_mul(width.bytes() as u8);
        #[expect(clippy::cast_possible_truncation, reason = "widths are at most 64 bits")]
        per_width.clamp(1, width.bits() as u8)
    }
}

/// The best coefficient vector a search found, with its quality.
#[expect(clippy::exhaustive_structs, reason = "read-mostly result record")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchOutcome {
    /// The winning coefficient vector.
    pub coefficients: Coefficients,

    /// The accumulator width the vector was found at.
    pub width: Width,

    /// Where the vector lands on the quality scale. `Collision` means the
    /// search exhausted its bounds (or was cancelled) without a usable
    /// vector.
    pub classification: Classification,

    /// Table slots no key would occupy.
    pub wasted_slots: u64,

    /// The smallest hash over all keys, for offset-indexed tables.
    pub min_hash: u64,
}

impl SearchOutcome {
    /// The outcome of a search that found nothing at all.
    const fn nothing(width: Width) -> Self {
        Self {
            coefficients: Coefficients { c0: 0, c1: 0, c2: 0, c3: 0, c4: 0, c5: 0 },
            width,
            classification: Classification::Collision,
            wasted_slots: u64::MAX,
            min_hash: 0,
        }
    }

    /// Whether `verdict` under `coefficients` beats this outcome.
    ///
    /// Strictly better only: classification first, then fewer contributing
    /// coefficients, then fewer wasted slots. Ties keep the incumbent, so the
    /// enumeration order fixes the winner.
    fn beaten_by(&self, verdict: &Verdict, coefficients: &Coefficients) -> bool {
        verdict
            .classification
            .cmp(&self.classification)
            .then(self.coefficients.non_zero_count().cmp(&coefficients.non_zero_count()))
            .then(self.wasted_slots.cmp(&verdict.wasted_slots))
            .is_gt()
    }
}

/// Observer of search progress.
///
/// Called from the third-outermost loop level with a monotone percentage and
/// a phrase describing the best outcome so far.
pub trait Progress {
    /// Report that the search is `percent` done in its current width.
    fn report(&mut self, percent: u8, status: &str);
}

/// A [`Progress`] observer that discards every report.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentProgress;

impl Progress for SilentProgress {
    #[inline]
    fn report(&mut self, _percent: u8, _status: &str) {}
}

/// Exhaust one accumulator width.
///
/// The nesting order is `c3`, `c2`, `c1`, then the shifts `c4` and `c5`,
/// with the additive `c0` innermost. Cancellation is polled once per `c4`
/// value; a cancelled search returns its best outcome so far rather than an
/// error.
fn search_width<W: HashWord, K: PhfKey>(
    keys: &[K],
    acceptable_empties: u64,
    bounds: SearchBounds,
    cancel: &AtomicBool,
    progress: &mut dyn Progress,
) -> SearchOutcome {
    let mut best = SearchOutcome::nothing(W::WIDTH);
    let mut scratch = Scratch::new(W::WIDTH.bits(), keys.len(), acceptable_empties);
    let shift_bound = bounds.shift_bound(W::WIDTH);
    let scale = u32::from(bounds.scale);

    for c3 in 0..bounds.scale {
        for c2 in 0..bounds.scale {
            for c1 in 0..bounds.scale {
                #[expect(clippy::cast_possible_truncation, reason = "the percentage is below 100")]
                let percent = (u32::from(c3) * 100 / scale
                    + u32::from(c2) * 100 / (scale * scale)) as u8;
                progress.report(percent, best.classification.status_phrase());

                for c4 in 0..shift_bound {
                    if cancel.load(Ordering::Relaxed) {
                        return best;
                    }
                    for c5 in 0..shift_bound {
                        for c0 in 0..bounds.add {
                            let coefficients = Coefficients { c0, c1, c2, c3, c4, c5 };
                            let verdict =
                                classify::<W, K>(keys, &coefficients, acceptable_empties, &mut scratch);
                            if best.beaten_by(&verdict, &coefficients) {
                                best = SearchOutcome {
                                    coefficients,
                                    width: W::WIDTH,
                                    classification: verdict.classification,
                                    wasted_slots: verdict.wasted_slots,
                                    min_hash: verdict.min_hash,
                                };
                                // A zero-waste offset table with a single
                                // active coefficient cannot be beaten on any
                                // tie-break axis. Anything less keeps the
                                // enumeration going: a later vector of equal
                                // rank may still win on fewer coefficients.
                                if best.classification == Classification::MinimalByOffset
                                    && best.coefficients.non_zero_count() == 1
                                {
                                    return best;
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    best
}

/// Search the coefficient space, escalating the accumulator width as needed.
///
/// Each width on the escalation ladder is exhausted before the next is
/// tried; the first width yielding any non-colliding vector wins, so the
/// result always uses the narrowest sufficient accumulator. A pre-set or
/// newly raised `cancel` flag stops the search and returns the best outcome
/// seen, which callers can tell apart from success by its classification.
pub fn find_coefficients<K: PhfKey>(
    keys: &[K],
    acceptable_empties: u64,
    bounds: SearchBounds,
    cancel: &AtomicBool,
    progress: &mut dyn Progress,
) -> SearchOutcome {
    let mut best = SearchOutcome::nothing(Width::ladder(keys.len())[0]);

    for &width in Width::ladder(keys.len()) {
        let outcome = match width {
            Width::U8 => search_width::<u8, K>(keys, acceptable_empties, bounds, cancel, progress),
            Width::U16 => search_width::<u16, K>(keys, acceptable_empties, bounds, cancel, progress),
            Width::U32 => search_width::<u32, K>(keys, acceptable_empties, bounds, cancel, progress),
            Width::U64 => search_width::<u64, K>(keys, acceptable_empties, bounds, cancel, progress),
        };
        if outcome.classification > best.classification {
            best = outcome;
        }
        if best.classification > Classification::Collision || cancel.load(Ordering::Relaxed) {
            break;
        }
    }

    best
}
