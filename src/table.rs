//! Static lookup tables built from a winning hash.
//!
//! A built map is the handoff artifact: the hash parameters plus a slot
//! table, with enough structure for the codegen boundary to render it and
//! for lookups to verify membership. The empty-slot sentinel is `None`, so
//! no reserved key or value is needed.

#![expect(
    clippy::arithmetic_side_effects,
    reason = "slot arithmetic stays within table bounds fixed at construction"
)]

use crate::classify::Classification;
use crate::family::{hash_at, Coefficients, PhfKey, Width};
use crate::search::SearchOutcome;
use crate::split::TwoLevelPhf;

/// How a single-level hash value turns into a table slot.
#[expect(clippy::exhaustive_enums, reason = "the indexing modes are fixed by the quality scale")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Indexing {
    /// Subtract the minimum hash observed over the keys.
    Offset {
        /// The smallest hash over all keys.
        min_hash: u64,
    },
    /// Reduce the hash modulo the table length.
    Modulus {
        /// The table length. Never zero.
        divisor: u64,
    },
    /// Use the raw hash against a sorted arm table.
    Direct,
}

/// The complete lookup procedure of a built map.
#[expect(clippy::exhaustive_enums, reason = "mirrors the two construction strategies")]
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LookupFn {
    /// One coefficient hash, then an indexing step.
    SingleLevel {
        /// The winning coefficient vector.
        coefficients: Coefficients,
        /// The accumulator width the vector was found at.
        width: Width,
        /// Hash-to-slot mapping.
        indexing: Indexing,
    },
    /// The seeded two-level fallback.
    TwoLevel(TwoLevelPhf),
}

/// The slot storage of a built map.
#[expect(clippy::exhaustive_enums, reason = "mirrors the two indexing families")]
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Layout<K, V> {
    /// Slot-indexed table. Empty slots hold `None`.
    Dense(Vec<Option<(K, V)>>),
    /// `(hash, key, value)` arms sorted by hash, for direct indexing.
    Sparse(Vec<(u64, K, V)>),
}

/// A static map from keys to values with a collision-free hash.
///
/// Lookups re-hash the key with the stored parameters, then verify the
/// stored key before returning the value, so keys outside the original set
/// fall through to the default value rather than aliasing a slot.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuiltMap<K, V> {
    /// The lookup procedure.
    lookup_fn: LookupFn,

    /// The slot storage.
    layout: Layout<K, V>,

    /// Returned for keys outside the original set.
    default_value: V,

    /// Number of keys the map was built from.
    len: usize,
}

impl<K: PhfKey, V> BuiltMap<K, V> {
    /// Initialize from saved data.
    ///
    /// Meant for codegen, not for public use. The parts must come from
    /// a genuine build; mismatched parameters and layout make lookups
    /// return arbitrary slots.
    #[doc(hidden)]
    #[inline]
    #[must_use]
    pub fn __from_raw_parts(
        lookup_fn: LookupFn,
        layout: Layout<K, V>,
        default_value: V,
        len: usize,
    ) -> Self {
        Self { lookup_fn, layout, default_value, len }
    }

    /// The dense-table slot a key would occupy.
    ///
    /// `None` for out-of-range hashes under offset indexing and for sparse
    /// (direct-indexed) maps, which have no slot numbering.
    #[inline]
    #[must_use]
    pub fn slot_of(&self, key: &K) -> Option<usize> {
        match &self.lookup_fn {
            LookupFn::TwoLevel(phf) => Some(phf.slot_of(key)),
            LookupFn::SingleLevel { coefficients, width, indexing } => {
                let hash = hash_at(key, coefficients, *width);
                match *indexing {
                    Indexing::Offset { min_hash } => {
                        usize::try_from(hash.checked_sub(min_hash)?).ok()
                    }
                    Indexing::Modulus { divisor } => usize::try_from(hash % divisor).ok(),
                    Indexing::Direct => None,
                }
            }
        }
    }

    /// The stored entry a key resolves to, before key verification.
    fn entry_of(&self, key: &K) -> Option<(&K, &V)> {
        match &self.layout {
            Layout::Dense(slots) => {
                slots.get(self.slot_of(key)?)?.as_ref().map(|entry| (&entry.0, &entry.1))
            }
            Layout::Sparse(arms) => {
                let LookupFn::SingleLevel { coefficients, width, .. } = &self.lookup_fn else {
                    return None;
                };
                let hash = hash_at(key, coefficients, *width);
                let index = arms.binary_search_by_key(&hash, |arm| arm.0).ok()?;
                arms.get(index).map(|arm| (&arm.1, &arm.2))
            }
        }
    }

    /// The value stored for a key, or `None` for keys outside the set.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entry_of(key).filter(|&(stored, _)| stored == key).map(|(_, value)| value)
    }

    /// The value stored for a key, or the default value for keys outside the
    /// set.
    #[inline]
    #[must_use]
    pub fn lookup(&self, key: &K) -> &V {
        self.get(key).unwrap_or(&self.default_value)
    }

    /// Like [`lookup`](Self::lookup), skipping the key verification.
    ///
    /// Faster, but a key outside the original set may return the value of
    /// whatever entry shares its slot instead of the default.
    #[inline]
    #[must_use]
    pub fn lookup_unverified(&self, key: &K) -> &V {
        self.entry_of(key).map_or(&self.default_value, |(_, value)| value)
    }

    /// Number of keys the map was built from.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the map holds no keys.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The lookup procedure.
    #[inline]
    #[must_use]
    pub const fn lookup_fn(&self) -> &LookupFn {
        &self.lookup_fn
    }

    /// The slot storage.
    #[inline]
    #[must_use]
    pub const fn layout(&self) -> &Layout<K, V> {
        &self.layout
    }

    /// The value returned for keys outside the set.
    #[inline]
    #[must_use]
    pub const fn default_value(&self) -> &V {
        &self.default_value
    }

    /// The stored entries, in slot order.
    #[inline]
    pub fn entries(&self) -> impl Iterator<Item = (&K, &V)> {
        let (dense, sparse) = match &self.layout {
            Layout::Dense(slots) => (Some(slots), None),
            Layout::Sparse(arms) => (None, Some(arms)),
        };
        dense
            .into_iter()
            .flatten()
            .filter_map(|slot| slot.as_ref().map(|entry| (&entry.0, &entry.1)))
            .chain(sparse.into_iter().flatten().map(|arm| (&arm.1, &arm.2)))
    }
}

/// Fill a dense slot table, placing each entry at `slot_of(hash)`.
fn dense_layout<K: PhfKey, V>(
    keys: Vec<K>,
    values: Vec<V>,
    table_len: usize,
    outcome: &SearchOutcome,
    slot_of: impl Fn(u64) -> usize,
) -> Layout<K, V> {
    let mut slots: Vec<Option<(K, V)>> = (0..table_len).map(|_| None).collect();
    for (key, value) in keys.into_iter().zip(values) {
        let slot = slot_of(hash_at(&key, &outcome.coefficients, outcome.width));
        debug_assert!(slots[slot].is_none(), "a non-colliding outcome fills each slot once");
        slots[slot] = Some((key, value));
    }
    Layout::Dense(slots)
}

/// Build a map around a single-level search outcome.
///
/// The outcome's classification picks the indexing: offset and modulus
/// outcomes get a dense table of `len + wasted_slots` entries, the
/// uncompacted outcome gets sorted arms over raw hashes. The outcome must
/// not be a collision.
pub(crate) fn build_single_level<K: PhfKey, V>(
    keys: Vec<K>,
    values: Vec<V>,
    default_value: V,
    outcome: &SearchOutcome,
) -> BuiltMap<K, V> {
    debug_assert!(
        outcome.classification > Classification::Collision,
        "colliding outcomes cannot build a table"
    );
    let len = keys.len();

    let (indexing, layout) = match outcome.classification {
        Classification::MinimalByOffset | Classification::DenseByOffset => {
            let min_hash = outcome.min_hash;
            #[expect(clippy::cast_possible_truncation, reason = "table sizes fit in memory")]
            let table_len = len + outcome.wasted_slots as usize;
            let layout = dense_layout(keys, values, table_len, outcome, |hash| {
                #[expect(clippy::cast_possible_truncation, reason = "offsets are below the table length")]
                let slot = (hash - min_hash) as usize;
                slot
            });
            (Indexing::Offset { min_hash }, layout)
        }
        Classification::MinimalByModulus | Classification::DenseByModulus => {
            let divisor = len as u64
                + if outcome.classification == Classification::DenseByModulus {
                    outcome.wasted_slots
                } else {
                    0
                };
            #[expect(clippy::cast_possible_truncation, reason = "table sizes fit in memory")]
            let table_len = divisor as usize;
            let layout = dense_layout(keys, values, table_len, outcome, |hash| {
                #[expect(clippy::cast_possible_truncation, reason = "residues are below the table length")]
                let slot = (hash % divisor) as usize;
                slot
            });
            (Indexing::Modulus { divisor }, layout)
        }
        Classification::Perfect | Classification::Collision => {
            let mut arms: Vec<(u64, K, V)> = keys
                .into_iter()
                .zip(values)
                .map(|(key, value)| {
                    (hash_at(&key, &outcome.coefficients, outcome.width), key, value)
                })
                .collect();
            arms.sort_unstable_by_key(|arm| arm.0);
            let layout = Layout::Sparse(arms);
            (Indexing::Direct, layout)
        }
    };

    BuiltMap {
        lookup_fn: LookupFn::SingleLevel {
            coefficients: outcome.coefficients,
            width: outcome.width,
            indexing,
        },
        layout,
        default_value,
        len,
    }
}

/// Build a map around a two-level hash.
pub(crate) fn build_two_level<K: PhfKey, V>(
    keys: Vec<K>,
    values: Vec<V>,
    default_value: V,
    phf: TwoLevelPhf,
) -> BuiltMap<K, V> {
    let len = keys.len();
    let mut slots: Vec<Option<(K, V)>> = (0..phf.table_len()).map(|_| None).collect();
    for (key, value) in keys.into_iter().zip(values) {
        let slot = phf.slot_of(&key);
        debug_assert!(slots[slot].is_none(), "the split guarantees disjoint slots");
        slots[slot] = Some((key, value));
    }
    BuiltMap {
        lookup_fn: LookupFn::TwoLevel(phf),
        layout: Layout::Dense(slots),
        default_value,
        len,
    }
}

#[cfg(feature = "codegen")]
mod codegen_impls {
    use super::{BuiltMap, Indexing, Layout, LookupFn};
    use crate::codegen::{Codegen, CodeGenerator};
    use proc_macro2::TokenStream;
    use quote::quote;

    impl Codegen for Indexing {
        #[inline]
        fn generate_piece(&self, gen: &mut CodeGenerator) -> TokenStream {
            let krate = gen.krate();
            match *self {
                Self::Offset { min_hash } => {
                    quote!(#krate::Indexing::Offset { min_hash: #min_hash })
                }
                Self::Modulus { divisor } => {
                    quote!(#krate::Indexing::Modulus { divisor: #divisor })
                }
                Self::Direct => quote!(#krate::Indexing::Direct),
            }
        }
    }

    impl Codegen for LookupFn {
        #[inline]
        fn generate_piece(&self, gen: &mut CodeGenerator) -> TokenStream {
            let krate = gen.krate();
            match self {
                Self::SingleLevel { coefficients, width, indexing } => {
                    let coefficients = gen.piece(coefficients);
                    let width = gen.piece(width);
                    let indexing = gen.piece(indexing);
                    quote!(#krate::LookupFn::SingleLevel {
                        coefficients: #coefficients,
                        width: #width,
                        indexing: #indexing,
                    })
                }
                Self::TwoLevel(phf) => {
                    let phf = gen.piece(phf);
                    quote!(#krate::LookupFn::TwoLevel(#phf))
                }
            }
        }
    }

    impl<K: Codegen, V: Codegen> Codegen for Layout<K, V> {
        #[inline]
        fn generate_piece(&self, gen: &mut CodeGenerator) -> TokenStream {
            let krate = gen.krate();
            match self {
                Self::Dense(slots) => {
                    let slots = gen.piece(slots);
                    quote!(#krate::Layout::Dense(#slots))
                }
                Self::Sparse(arms) => {
                    let arms = gen.piece(arms);
                    quote!(#krate::Layout::Sparse(#arms))
                }
            }
        }
    }

    impl<K: Codegen, V: Codegen> Codegen for BuiltMap<K, V> {
        #[inline]
        fn generate_piece(&self, gen: &mut CodeGenerator) -> TokenStream {
            let krate = gen.krate();
            let lookup_fn = gen.piece(&self.lookup_fn);
            let layout = gen.piece(&self.layout);
            let default_value = gen.piece(&self.default_value);
            let len = self.len;
            quote!(#krate::BuiltMap::__from_raw_parts(
                #lookup_fn, #layout, #default_value, #len,
            ))
        }
    }
}
