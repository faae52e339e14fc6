//! The coefficient hash family.
//!
//! Every candidate hash function the search explores is one point in a small
//! coefficient space: six single-byte coefficients driving an accumulator loop
//! over the key bytes. All arithmetic wraps at the accumulator width; the
//! wraparound is load-bearing, as the search exploits overflow patterns to
//! find collision-free mappings.

use core::hash::Hash;

/// One instance of the hash family: the `(c0..c5)` coefficient tuple.
///
/// `c0`, `c1` and `c2` scale the key byte before it is added, multiplied and
/// xored into the accumulator; `c3` scales the accumulator itself; `c4` and
/// `c5` are left/right shift amounts. A zero coefficient disables its step
/// rather than zeroing the accumulator.
#[expect(clippy::exhaustive_structs, reason = "plain coefficient tuple, constructed by struct literal")]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coefficients {
    /// Byte scale for the additive step.
    pub c0: u8,
    /// Byte scale for the multiplicative step, or 0 to skip it.
    pub c1: u8,
    /// Byte scale for the xor step.
    pub c2: u8,
    /// Accumulator self-scale in the mixing step.
    pub c3: u8,
    /// Left shift amount in the mixing step, or 0 to skip it.
    pub c4: u8,
    /// Right shift amount in the mixing step, or 0 to skip it.
    pub c5: u8,
}

impl Coefficients {
    /// The number of coefficients that actually contribute to the hash.
    ///
    /// Used as a tie-break: among equally classified outcomes, fewer active
    /// coefficients means simpler and faster generated lookup code.
    #[inline]
    #[must_use]
    pub const fn non_zero_count(&self) -> u8 {
        (self.c0 != 0) as u8
            + (self.c1 != 0) as u8
            + (self.c2 != 0) as u8
            + (self.c3 != 0) as u8
            + (self.c4 != 0) as u8
            + (self.c5 != 0) as u8
    }
}

/// Accumulator widths the search can target.
///
/// Ordered narrowest to widest; the search starts at the narrowest width able
/// to index the table and widens only when a width is exhausted without
/// a collision-free vector.
#[expect(clippy::exhaustive_enums, reason = "the accumulator widths are closed")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Width {
    /// 8-bit accumulator; up to 256 keys.
    U8,
    /// 16-bit accumulator; up to 65536 keys.
    U16,
    /// 32-bit accumulator; up to 2^32 keys.
    U32,
    /// 64-bit accumulator.
    U64,
}

impl Width {
    /// Width in bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::U8 => 8,
            Self::U16 => 16,
            Self::U32 => 32,
            Self::U64 => 64,
        }
    }

    /// Width in bytes.
    #[inline]
    #[must_use]
    pub const fn bytes(self) -> u32 {
        self.bits() / 8
    }

    /// The escalation ladder for a given key count: the narrowest width whose
    /// output range can hold the keys, followed by every wider width.
    #[inline]
    #[must_use]
    pub fn ladder(key_count: usize) -> &'static [Self] {
        const LADDER: [Width; 4] = [Width::U8, Width::U16, Width::U32, Width::U64];
        if key_count <= 1 << 8 {
            &LADDER
        } else if key_count <= 1 << 16 {
            &LADDER[1..]
        } else if u64::try_from(key_count).is_ok_and(|count| count <= 1 << 32) {
            &LADDER[2..]
        } else {
            &LADDER[3..]
        }
    }
}

/// Scope for the [`HashWord`] seal.
mod sealed {
    /// Prevents downstream [`HashWord`](super::HashWord) implementations.
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
}

/// An unsigned accumulator word.
///
/// Implemented for `u8`, `u16`, `u32` and `u64` only; each width is a separate
/// monomorphization of the search loop, so no dispatch happens per byte.
pub trait HashWord: Copy + Ord + Eq + sealed::Sealed {
    /// The [`Width`] this word corresponds to.
    const WIDTH: Width;

    /// The zero accumulator.
    const ZERO: Self;

    /// Zero-extend a key byte into the word.
    fn from_byte(byte: u8) -> Self;

    /// Addition modulo `2^width`.
    fn wrapping_add(self, rhs: Self) -> Self;

    /// Multiplication modulo `2^width`.
    fn wrapping_mul(self, rhs: Self) -> Self;

    /// Bitwise xor.
    fn xor(self, rhs: Self) -> Self;

    /// Left shift. `amount` must be below the word width.
    fn shl(self, amount: u8) -> Self;

    /// Right shift. `amount` must be below the word width.
    fn shr(self, amount: u8) -> Self;

    /// Zero-extend into a `u64` for width-independent bookkeeping.
    fn widen(self) -> u64;
}

/// Implement [`HashWord`] by forwarding to the primitive operations.
macro_rules! impl_hash_word {
    ($($ty:ty => $width:ident,)*) => {
        $(
            impl HashWord for $ty {
                const WIDTH: Width = Width::$width;
                const ZERO: Self = 0;

                #[inline]
                fn from_byte(byte: u8) -> Self {
                    Self::from(byte)
                }

                #[inline]
                fn wrapping_add(self, rhs: Self) -> Self {
                    <$ty>::wrapping_add(self, rhs)
                }

                #[inline]
                fn wrapping_mul(self, rhs: Self) -> Self {
                    <$ty>::wrapping_mul(self, rhs)
                }

                #[inline]
                fn xor(self, rhs: Self) -> Self {
                    self ^ rhs
                }

                #[inline]
                fn shl(self, amount: u8) -> Self {
                    self << amount
                }

                #[inline]
                fn shr(self, amount: u8) -> Self {
                    self >> amount
                }

                #[inline]
                fn widen(self) -> u64 {
                    u64::from(self)
                }
            }
        )*
    };
}
impl_hash_word! {
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
}

/// Run the accumulator loop over a byte sequence at width `W`.
///
/// Per byte: add `c0*ch`, multiply by `c1*ch` (skipped when `c1 == 0`), xor
/// `c2*ch`, then xor in `(acc << c4) + (acc >> c5) + c3*acc` with disabled
/// terms contributing zero. Everything wraps.
pub(crate) fn accumulate<W: HashWord>(
    bytes: impl IntoIterator<Item = u8>,
    coefficients: &Coefficients,
) -> W {
    let mut acc = W::ZERO;
    for byte in bytes {
        let ch = W::from_byte(byte);
        acc = acc.wrapping_add(W::from_byte(coefficients.c0).wrapping_mul(ch));
        if coefficients.c1 != 0 {
            acc = acc.wrapping_mul(W::from_byte(coefficients.c1).wrapping_mul(ch));
        }
        acc = acc.xor(W::from_byte(coefficients.c2).wrapping_mul(ch));
        let shifted_left = if coefficients.c4 != 0 {
            acc.shl(coefficients.c4)
        } else {
            W::ZERO
        };
        let shifted_right = if coefficients.c5 != 0 {
            acc.shr(coefficients.c5)
        } else {
            W::ZERO
        };
        let scaled = W::from_byte(coefficients.c3).wrapping_mul(acc);
        acc = acc.xor(shifted_left.wrapping_add(shifted_right).wrapping_add(scaled));
    }
    acc
}

/// A key the search can hash.
///
/// Keys are either ordered byte sequences or fixed-width unsigned integers.
/// Both hash functions must be deterministic and depend on nothing but the key
/// and the parameter: the winning parameters alone reconstruct every slot.
pub trait PhfKey: Eq + Hash + Clone {
    /// Hash through the coefficient family at width `W`.
    ///
    /// Byte-sequence keys run the accumulator loop over their bytes; integer
    /// keys run it over their fixed-width little-endian representation.
    fn coefficient_hash<W: HashWord>(&self, coefficients: &Coefficients) -> W;

    /// The seeded hash of the two-level scheme.
    ///
    /// Byte-sequence keys fold each byte with `h = h*seed + byte` (wrapping at
    /// 32 bits); integer keys use a single avalanche mix parameterized by the
    /// 16-bit seed.
    fn seeded_hash(&self, seed: u16) -> u32;
}

/// Seeded hash for byte-sequence keys.
fn seeded_hash_bytes(bytes: &[u8], seed: u16) -> u32 {
    let mut hash: u32 = 0;
    for &byte in bytes {
        hash = hash.wrapping_mul(u32::from(seed)).wrapping_add(u32::from(byte));
    }
    hash
}

/// Implement [`PhfKey`] for types that expose their bytes.
macro_rules! impl_byte_key {
    ($($ty:ty => |$key:ident| $bytes:expr,)*) => {
        $(
            impl PhfKey for $ty {
                #[inline]
                fn coefficient_hash<W: HashWord>(&self, coefficients: &Coefficients) -> W {
                    let $key = self;
                    accumulate($bytes.iter().copied(), coefficients)
                }

                #[inline]
                fn seeded_hash(&self, seed: u16) -> u32 {
                    let $key = self;
                    seeded_hash_bytes($bytes, seed)
                }
            }
        )*
    };
}
impl_byte_key! {
    &str => |key| key.as_bytes(),
    String => |key| key.as_bytes(),
    &[u8] => |key| key,
    Vec<u8> => |key| key.as_slice(),
}

/// Implement [`PhfKey`] for fixed-width unsigned integers.
macro_rules! impl_uint_key {
    ($($ty:ty),*) => {
        $(
            impl PhfKey for $ty {
                #[inline]
                fn coefficient_hash<W: HashWord>(&self, coefficients: &Coefficients) -> W {
                    accumulate(self.to_le_bytes(), coefficients)
                }

                #[inline]
                #[expect(clippy::cast_possible_truncation, reason = "the avalanche folds to the low 32 bits")]
                fn seeded_hash(&self, seed: u16) -> u32 {
                    let mut x = u64::from(*self);
                    x = ((x >> 7) ^ x).wrapping_mul(u64::from(seed));
                    x = (x >> 7) ^ x;
                    x as u32
                }
            }
        )*
    };
}
impl_uint_key!(u8, u16, u32, u64);

/// Hash a key at a runtime-chosen width, widened to `u64`.
///
/// The width dispatch happens once per call, outside any loop; the search
/// itself is monomorphized per width and never goes through this.
pub(crate) fn hash_at<K: PhfKey>(key: &K, coefficients: &Coefficients, width: Width) -> u64 {
    match width {
        Width::U8 => key.coefficient_hash::<u8>(coefficients).widen(),
        Width::U16 => key.coefficient_hash::<u16>(coefficients).widen(),
        Width::U32 => key.coefficient_hash::<u32>(coefficients).widen(),
        Width::U64 => key.coefficient_hash::<u64>(coefficients).widen(),
    }
}

#[cfg(feature = "codegen")]
impl crate::codegen::Codegen for Coefficients {
    #[inline]
    fn generate_piece(&self, gen: &mut crate::codegen::CodeGenerator) -> proc_macro2::TokenStream {
        let krate = gen.krate();
        let Self { c0, c1, c2, c3, c4, c5 } = *self;
        quote::quote!(#krate::Coefficients {
            c0: #c0, c1: #c1, c2: #c2, c3: #c3, c4: #c4, c5: #c5,
        })
    }
}

#[cfg(feature = "codegen")]
impl crate::codegen::Codegen for Width {
    #[inline]
    fn generate_piece(&self, gen: &mut crate::codegen::CodeGenerator) -> proc_macro2::TokenStream {
        let krate = gen.krate();
        match self {
            Self::U8 => quote::quote!(#krate::Width::U8),
            Self::U16 => quote::quote!(#krate::Width::U16),
            Self::U32 => quote::quote!(#krate::Width::U32),
            Self::U64 => quote::quote!(#krate::Width::U64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn additive_only_is_byte_sum() {
        let coefficients = Coefficients { c0: 1, ..Coefficients::default() };
        let hash: u8 = accumulate([3, 4, 5], &coefficients);
        assert_eq!(hash, 12);
    }

    #[test]
    fn zero_c1_skips_multiplication() {
        // With c1 == 0 the multiplicative step must not zero the accumulator.
        let coefficients = Coefficients { c0: 2, c1: 0, ..Coefficients::default() };
        let hash: u8 = accumulate([7], &coefficients);
        assert_eq!(hash, 14);
    }

    #[test]
    fn wrapping_is_defined_behavior() {
        let coefficients = Coefficients { c0: 33, c1: 17, c2: 9, c3: 5, c4: 3, c5: 2 };
        // Must not panic on overflow at any width.
        let _: u8 = accumulate(b"overflow me plenty".iter().copied(), &coefficients);
        let _: u64 = accumulate(b"overflow me plenty".iter().copied(), &coefficients);
    }

    #[test]
    fn widths_agree_below_overflow() {
        // As long as no intermediate value reaches 256, every width computes
        // the same number.
        let coefficients = Coefficients { c0: 1, c2: 2, ..Coefficients::default() };
        let narrow: u8 = accumulate([13], &coefficients);
        let wide: u64 = accumulate([13], &coefficients);
        assert_eq!(u64::from(narrow), wide);
    }

    #[test]
    fn integer_keys_hash_their_le_bytes() {
        let coefficients = Coefficients { c0: 1, ..Coefficients::default() };
        let from_int: u16 = 0x0102_u16.coefficient_hash(&coefficients);
        let from_bytes: u16 = accumulate([0x02, 0x01], &coefficients);
        assert_eq!(from_int, from_bytes);
    }

    #[test]
    fn seeded_hash_matches_fold() {
        // h = ((0*s + 'h')*s + 'i') for "hi"
        let seed = 31_u16;
        let expected = u32::from(b'h')
            .wrapping_mul(31)
            .wrapping_add(u32::from(b'i'));
        assert_eq!("hi".seeded_hash(seed), expected);
    }

    #[test]
    fn ladder_starts_at_narrowest_indexable_width() {
        assert_eq!(Width::ladder(2)[0], Width::U8);
        assert_eq!(Width::ladder(256)[0], Width::U8);
        assert_eq!(Width::ladder(257)[0], Width::U16);
        assert_eq!(Width::ladder(1 << 16)[0], Width::U16);
        assert_eq!(Width::ladder((1 << 16) + 1)[0], Width::U32);
    }

    #[test]
    fn non_zero_count() {
        assert_eq!(Coefficients::default().non_zero_count(), 0);
        let all = Coefficients { c0: 1, c1: 2, c2: 3, c3: 4, c4: 5, c5: 1 };
        assert_eq!(all.non_zero_count(), 6);
        let some = Coefficients { c0: 1, c2: 3, ..Coefficients::default() };
        assert_eq!(some.non_zero_count(), 2);
    }
}
