//! Build-time search for coefficient-family perfect hash functions.
//!
//! Given a fixed key set, this crate searches a small six-coefficient hash
//! family for a function that maps the keys without collisions, classifies
//! how tightly the hashes pack, and builds a static lookup table around the
//! winner. Key sets the family cannot separate fall back to a seeded
//! two-level scheme. Construction is deterministic: the same keys and
//! configuration always produce bit-identical tables.
//!
//! The intended consumer is a build script or code generator: construct
//! a [`BuiltMap`] once, render it through [`codegen`], and ship the result
//! as plain data with `O(1)` lookups and no runtime construction.
//!
//! ```
//! use core::sync::atomic::AtomicBool;
//! use phgen::{build, BuildConfig, SearchBounds, SilentProgress};
//!
//! let keys = vec!["pi", "mu", "xi"];
//! let values = vec!["π", "μ", "ξ"];
//! let config = BuildConfig {
//!     // A slice of the search space is plenty for three keys.
//!     bounds: SearchBounds { scale: 8, add: 16, shift_per_byte: 2 },
//!     ..BuildConfig::default()
//! };
//! let map = build(
//!     keys,
//!     values,
//!     "?",
//!     &config,
//!     &AtomicBool::new(false),
//!     &mut SilentProgress,
//! )?;
//! assert_eq!(map.lookup(&"pi"), &"π");
//! assert_eq!(map.lookup(&"nu"), &"?");
//! # Ok::<(), phgen::Error>(())
//! ```

mod bitset;
mod builder;
mod classify;
pub mod codegen;
mod error;
mod family;
mod search;
mod split;
mod table;

pub use builder::{build, BuildConfig, Strategy, SINGLE_LEVEL_KEY_CEILING};
pub use classify::Classification;
pub use error::Error;
pub use family::{Coefficients, HashWord, PhfKey, Width};
pub use search::{find_coefficients, Progress, SearchBounds, SearchOutcome, SilentProgress};
pub use split::{split, SplitConfig, TwoLevelPhf};
pub use table::{BuiltMap, Indexing, Layout, LookupFn};

#[cfg(test)]
mod tests;
