//! Bit set API.

#![expect(
    clippy::arithmetic_side_effects,
    reason = "bit indices are divided and masked by the constant 8"
)]

/// Bit-compressed `Vec<bool>`, starting out all zero.
///
/// Used as the presence set during classification and as the occupancy map of
/// the shared final table in the two-level scheme.
pub(crate) struct BitSet {
    /// Underlying container.
    ///
    /// Bit `index` is stored in byte `index / 8` at bit `index % 8`, counting
    /// from LSB.
    data: Vec<u8>,
}

impl BitSet {
    /// Create a bit set of a given length, filled with zero bits.
    pub fn new_zeroes(len: usize) -> Self {
        Self {
            data: vec![0; len.div_ceil(8)],
        }
    }

    /// Set the bit at `index`, reporting whether it was previously unset.
    pub fn insert(&mut self, index: usize) -> bool {
        let byte = &mut self.data[index / 8];
        let mask = 1 << (index % 8);
        let was_unset = *byte & mask == 0;
        *byte |= mask;
        was_unset
    }

    /// Clear the bit at `index`.
    pub fn remove(&mut self, index: usize) {
        self.data[index / 8] &= !(1 << (index % 8));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_reports_novelty() {
        let mut set = BitSet::new_zeroes(100);
        assert!(set.insert(63));
        assert!(!set.insert(63));
        assert!(set.insert(64));
        set.remove(63);
        assert!(set.insert(63));
    }

    #[test]
    fn remove_only_touches_its_own_bit() {
        let mut set = BitSet::new_zeroes(16);
        assert!(set.insert(3));
        assert!(set.insert(11));
        set.remove(3);
        assert!(set.insert(3));
        assert!(!set.insert(11));
    }
}
