//! Result layout (offset computation)
//!
//! Maps each rank to the slice of the coordinator's output buffer its local
//! results will occupy:
//!
//! ```text
//! offset[0] = 0
//! offset[r] = offset[r - 1] + count[r - 1]
//! total     = offset[P - 1] + count[P - 1]
//! ```
//!
//! A zero count needs no special case: the rank gets an empty slot and the
//! next rank's offset is unchanged.

use serde::Serialize;
use std::ops::Range;

/// Per-rank `(count, offset)` table, held by the coordinator only
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultLayout {
    counts: Vec<u64>,
    offsets: Vec<usize>,
    total: usize,
}

impl ResultLayout {
    /// Number of ranks described
    pub fn ranks(&self) -> usize {
        self.counts.len()
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Length of the complete output buffer
    pub fn total(&self) -> usize {
        self.total
    }

    /// Declared count for `rank` (0 for ranks outside the table)
    pub fn count(&self, rank: usize) -> u64 {
        self.counts.get(rank).copied().unwrap_or(0)
    }

    pub fn offset(&self, rank: usize) -> Option<usize> {
        self.offsets.get(rank).copied()
    }

    /// Buffer range reserved for `rank`
    pub fn slot(&self, rank: usize) -> Option<Range<usize>> {
        let start = self.offset(rank)?;
        let end = self.offsets.get(rank + 1).copied().unwrap_or(self.total);
        Some(start..end)
    }
}

/// Exclusive prefix sum over `counts`
///
/// O(P) time and space. Returns `None` if the total does not fit in `usize`.
pub fn compute_layout(counts: &[u64]) -> Option<ResultLayout> {
    let mut offsets = Vec::with_capacity(counts.len());
    let mut running: usize = 0;

    for &count in counts {
        offsets.push(running);
        running = running.checked_add(usize::try_from(count).ok()?)?;
    }

    Some(ResultLayout {
        counts: counts.to_vec(),
        offsets,
        total: running,
    })
}
