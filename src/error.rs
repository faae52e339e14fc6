//! Construction failures.

use displaydoc::Display;
use thiserror::Error as ThisError;

/// Ways building a table can fail.
///
/// Input problems are caught before any search runs, so a failed build never
/// burns time on the coefficient space first.
#[derive(Clone, Copy, Debug, Display, ThisError, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// got {keys} keys but {values} values
    MismatchedKeyValueCounts {
        /// Number of keys supplied.
        keys: usize,
        /// Number of values supplied.
        values: usize,
    },

    /// keys at indices {first} and {second} are equal
    DuplicateKey {
        /// Index of the earlier occurrence.
        first: usize,
        /// Index of the later occurrence.
        second: usize,
    },

    /// need at least two keys, got {0}
    TooFewKeys(usize),

    /// no collision-free hash function within the search bounds
    NoCollisionFreeFunction,

    /// cancelled before a usable hash function was found
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn messages_carry_the_counts() {
        let error = Error::MismatchedKeyValueCounts { keys: 3, values: 5 };
        assert_eq!(error.to_string(), "got 3 keys but 5 values");
        assert_eq!(Error::TooFewKeys(1).to_string(), "need at least two keys, got 1");
        assert_eq!(
            Error::DuplicateKey { first: 0, second: 4 }.to_string(),
            "keys at indices 0 and 4 are equal"
        );
    }
}
