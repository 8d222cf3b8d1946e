//! Domain partitioning
//!
//! Splits the domain `[0, N)` into `P` contiguous half-open sub-ranges, one per
//! rank, in increasing rank order. The split is a pure function of `(N, P, r)`,
//! so every participant computes its own range without communicating.
//!
//! # Rule
//!
//! ```text
//! chunk = ceil(N / P)
//! start = min(r * chunk, N)
//! end   = min((r + 1) * chunk, N)      (always N for r == P - 1)
//! ```
//!
//! Clamping every rank (not only the last) keeps trailing ranks inside the
//! domain when `P > N`; they receive the empty range `[N, N)`.
//!
//! # Example
//!
//! ```
//! use rangesweep::partition::{partition, partition_all, SubRange};
//!
//! assert_eq!(partition(10, 3, 2).unwrap(), SubRange::new(8, 10));
//!
//! let ranges = partition_all(30, 3).unwrap();
//! assert_eq!(ranges, vec![
//!     SubRange::new(0, 10),
//!     SubRange::new(10, 20),
//!     SubRange::new(20, 30),
//! ]);
//! ```

use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open interval `[start, end)` of domain elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubRange {
    pub start: u64,
    pub end: u64,
}

impl SubRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Number of domain elements in the range (0 when `start >= end`)
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, n: u64) -> bool {
        self.start <= n && n < self.end
    }

    /// Ascending iterator over the range
    pub fn iter(&self) -> std::ops::Range<u64> {
        self.start..self.end.max(self.start)
    }

    /// Split this range into `parts` contiguous shards using the same
    /// ceil-chunk rule as [`partition`]
    ///
    /// Shards are returned in ascending order and exactly cover the range.
    /// Trailing shards may be empty.
    pub fn split(&self, parts: usize) -> Result<Vec<SubRange>, SearchError> {
        let local = partition_all(self.len(), parts)?;
        Ok(local
            .into_iter()
            .map(|r| SubRange::new(self.start + r.start, self.start + r.end))
            .collect())
    }
}

impl fmt::Display for SubRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Per-rank chunk size, `ceil(N / P)`
fn chunk_size(domain_size: u64, participants: u64) -> u64 {
    domain_size.div_ceil(participants)
}

/// Compute the sub-range owned by `rank`
///
/// # Errors
///
/// Returns `SearchError::Configuration` if `participants == 0` or
/// `rank >= participants`.
pub fn partition(domain_size: u64, participants: usize, rank: usize) -> Result<SubRange, SearchError> {
    if participants == 0 {
        return Err(SearchError::config("participant count must be at least 1"));
    }
    if rank >= participants {
        return Err(SearchError::config(format!(
            "rank {} is outside [0, {})",
            rank, participants
        )));
    }

    let p = participants as u64;
    let r = rank as u64;
    let chunk = chunk_size(domain_size, p);

    // r * chunk may exceed u64 only when it already exceeds N
    let start = r.checked_mul(chunk).map_or(domain_size, |s| s.min(domain_size));
    let end = if r == p - 1 {
        domain_size
    } else {
        (r + 1)
            .checked_mul(chunk)
            .map_or(domain_size, |e| e.min(domain_size))
    };

    Ok(SubRange::new(start, end))
}

/// Compute every rank's sub-range, in rank order
pub fn partition_all(domain_size: u64, participants: usize) -> Result<Vec<SubRange>, SearchError> {
    (0..participants.max(1))
        .map(|rank| partition(domain_size, participants, rank))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn assert_exact_cover(domain_size: u64, ranges: &[SubRange]) {
        let mut next = 0;
        for range in ranges {
            if range.is_empty() {
                // only trailing ranks are empty, parked at the domain end
                assert_eq!(range.start, domain_size);
                continue;
            }
            assert_eq!(range.start, next, "gap or overlap at {}", range);
            next = range.end;
        }
        assert_eq!(next, domain_size);
        let total: u64 = ranges.iter().map(|r| r.len()).sum();
        assert_eq!(total, domain_size);
    }

    #[test]
    fn test_even_split() {
        let ranges = partition_all(30, 3).unwrap();
        assert_eq!(
            ranges,
            vec![SubRange::new(0, 10), SubRange::new(10, 20), SubRange::new(20, 30)]
        );
    }

    #[test]
    fn test_uneven_split_clamps_last_rank() {
        let ranges = partition_all(10, 3).unwrap();
        assert_eq!(
            ranges,
            vec![SubRange::new(0, 4), SubRange::new(4, 8), SubRange::new(8, 10)]
        );
    }

    #[test]
    fn test_empty_domain() {
        for range in partition_all(0, 4).unwrap() {
            assert!(range.is_empty());
            assert_eq!(range.len(), 0);
        }
    }

    #[test]
    fn test_more_participants_than_elements() {
        let ranges = partition_all(3, 8).unwrap();
        assert_eq!(ranges[0], SubRange::new(0, 1));
        assert_eq!(ranges[1], SubRange::new(1, 2));
        assert_eq!(ranges[2], SubRange::new(2, 3));
        for range in &ranges[3..] {
            assert!(range.is_empty());
            assert!(range.start >= range.end);
            assert!(range.start <= 3);
        }
        assert_exact_cover(3, &ranges);
    }

    #[test]
    fn test_trailing_ranks_stay_inside_domain() {
        // chunk = 2, so rank 3 would start at 6 without clamping
        let ranges = partition_all(5, 4).unwrap();
        assert_eq!(
            ranges,
            vec![
                SubRange::new(0, 2),
                SubRange::new(2, 4),
                SubRange::new(4, 5),
                SubRange::new(5, 5),
            ]
        );
    }

    #[test]
    fn test_single_participant_owns_everything() {
        assert_eq!(partition(17, 1, 0).unwrap(), SubRange::new(0, 17));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(partition(10, 0, 0), Err(SearchError::Configuration(_))));
        assert!(matches!(partition(10, 3, 3), Err(SearchError::Configuration(_))));
        assert!(partition_all(10, 0).is_err());
    }

    #[test]
    fn test_huge_domain_does_not_overflow() {
        let ranges = partition_all(u64::MAX, 3).unwrap();
        assert_exact_cover(u64::MAX, &ranges);
        assert_eq!(ranges[2].end, u64::MAX);
    }

    #[test]
    fn test_deterministic() {
        for rank in 0..7 {
            assert_eq!(partition(1_000_003, 7, rank).unwrap(), partition(1_000_003, 7, rank).unwrap());
        }
    }

    #[test]
    fn test_random_coverage() {
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let n: u64 = rng.gen_range(0..5_000);
            let p: usize = rng.gen_range(1..64);
            let ranges = partition_all(n, p).unwrap();
            assert_eq!(ranges.len(), p);
            assert_exact_cover(n, &ranges);
        }
    }

    #[test]
    fn test_split_reuses_partition_rule() {
        let shards = SubRange::new(100, 110).split(3).unwrap();
        assert_eq!(
            shards,
            vec![SubRange::new(100, 104), SubRange::new(104, 108), SubRange::new(108, 110)]
        );

        let shards = SubRange::new(7, 7).split(4).unwrap();
        assert!(shards.iter().all(|s| s.is_empty()));
    }

    #[test]
    fn test_subrange_helpers() {
        let range = SubRange::new(4, 8);
        assert_eq!(range.len(), 4);
        assert!(range.contains(4));
        assert!(!range.contains(8));
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![4, 5, 6, 7]);
        assert_eq!(range.to_string(), "[4, 8)");

        let inverted = SubRange::new(9, 3);
        assert!(inverted.is_empty());
        assert_eq!(inverted.len(), 0);
        assert_eq!(inverted.iter().count(), 0);
    }
}
