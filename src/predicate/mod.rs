//! Local-compute predicates
//!
//! A participant's only job between the domain broadcast and the count
//! exchange is to scan its own sub-range and keep the elements that satisfy a
//! predicate. The aggregator never looks at element contents, so any
//! predicate can be plugged in here without touching the gather logic.
//!
//! # Predicates
//!
//! - **Prime**: trial division up to the integer square root
//! - **PerfectSquare**: `n == k * k` for some integer `k`
//! - **MultipleOf**: `n % divisor == 0`
//!
//! # Ordering
//!
//! [`scan_range`] always returns matches in ascending order. With more than one
//! shard the range is split with the partitioner's rule, shards are scanned on
//! the rayon pool, and the per-shard results are concatenated in shard order.
//!
//! # Example
//!
//! ```
//! use rangesweep::partition::SubRange;
//! use rangesweep::predicate::{scan_range, prime::PrimePredicate};
//!
//! let primes = scan_range(&PrimePredicate, SubRange::new(10, 20), 1);
//! assert_eq!(primes, vec![11, 13, 17, 19]);
//! ```

use crate::error::SearchError;
use crate::partition::SubRange;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod multiple;
pub mod prime;
pub mod square;

/// Membership test applied to every element of a participant's sub-range
///
/// Predicates are shared by reference across the shards of one scan, so they
/// must be `Send + Sync` and free of interior mutable state.
pub trait Predicate: Send + Sync {
    /// Short name used in logs and reports
    fn name(&self) -> &'static str;

    /// Whether `n` belongs to the result set
    fn matches(&self, n: u64) -> bool;
}

/// Predicate selection, as written in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PredicateKind {
    Prime,
    PerfectSquare,
    MultipleOf { divisor: u64 },
}

impl Default for PredicateKind {
    fn default() -> Self {
        Self::Prime
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prime => write!(f, "prime"),
            Self::PerfectSquare => write!(f, "perfect-square"),
            Self::MultipleOf { divisor } => write!(f, "multiple-of({})", divisor),
        }
    }
}

impl PredicateKind {
    /// Instantiate the predicate
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Configuration` for a `MultipleOf` divisor of 0.
    pub fn build(&self) -> Result<Box<dyn Predicate>, SearchError> {
        match *self {
            Self::Prime => Ok(Box::new(prime::PrimePredicate)),
            Self::PerfectSquare => Ok(Box::new(square::PerfectSquarePredicate)),
            Self::MultipleOf { divisor } => Ok(Box::new(multiple::MultipleOfPredicate::new(divisor)?)),
        }
    }
}

/// Scan `range` in increasing order and return every match
///
/// `shards > 1` spreads the scan over the rayon pool. The result is identical
/// to the sequential scan. An empty range yields an empty result.
pub fn scan_range(predicate: &dyn Predicate, range: SubRange, shards: usize) -> Vec<u64> {
    if shards <= 1 || range.len() < shards as u64 {
        return scan_sequential(predicate, range);
    }

    let Ok(pieces) = range.split(shards) else {
        return scan_sequential(predicate, range);
    };

    let per_shard: Vec<Vec<u64>> = pieces
        .par_iter()
        .map(|piece| scan_sequential(predicate, *piece))
        .collect();

    per_shard.concat()
}

fn scan_sequential(predicate: &dyn Predicate, range: SubRange) -> Vec<u64> {
    range.iter().filter(|&n| predicate.matches(n)).collect()
}
