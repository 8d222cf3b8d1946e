//! Two-phase result aggregation
//!
//! Builds the coordinator's globally ordered result sequence from every
//! participant's locally ordered result set, without any participant talking
//! to another directly.
//!
//! # Phases
//!
//! 1. **Count exchange**: every rank reports the length of its local result
//!    set; only the coordinator receives the table.
//! 2. **Offset computation** (coordinator only): exclusive prefix sum of the
//!    count table, see [`layout`].
//! 3. **Variable gather**: every rank's result set is written straight into its
//!    reserved slice of a single coordinator-owned buffer.
//!
//! # Ordering
//!
//! Sub-ranges are assigned in increasing rank order and each local result set
//! is ascending, so concatenating slices in rank order is already ascending.
//! No merge or sort step is needed.
//!
//! # Example
//!
//! ```
//! use rangesweep::aggregator::{self, layout::compute_layout};
//! use rangesweep::comm::local;
//!
//! let locals = vec![vec![2, 3, 5, 7], vec![11, 13, 17, 19], vec![23, 29]];
//!
//! let handles: Vec<_> = local::star(3, 0)
//!     .into_iter()
//!     .zip(locals)
//!     .map(|(mut comm, mine)| {
//!         std::thread::spawn(move || {
//!             let counts = aggregator::exchange_counts(&mut comm, mine.len() as u64, 0).unwrap();
//!             let layout = counts.map(|c| compute_layout(&c).unwrap());
//!             aggregator::gather_variable(&mut comm, &mine, layout.as_ref(), 0).unwrap()
//!         })
//!     })
//!     .collect();
//!
//! let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
//! let global = results[0].as_ref().unwrap();
//! assert_eq!(global.values(), &[2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
//! assert_eq!(global.layout().offsets(), &[0, 4, 8]);
//! assert!(results[1].is_none());
//! ```

use crate::comm::Collective;
use crate::error::SearchError;
use crate::participant::RunPhase;
use serde::Serialize;
use tracing::debug;

pub mod layout;

use layout::{compute_layout, ResultLayout};

/// Globally ordered results, owned by the coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalResultSequence {
    layout: ResultLayout,
    values: Vec<u64>,
}

impl GlobalResultSequence {
    fn new(layout: ResultLayout, values: Vec<u64>) -> Self {
        debug_assert_eq!(layout.total(), values.len());
        Self { layout, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn layout(&self) -> &ResultLayout {
        &self.layout
    }

    /// The slice contributed by `rank`
    pub fn slice_for(&self, rank: usize) -> Option<&[u64]> {
        self.layout.slot(rank).map(|slot| &self.values[slot])
    }

    /// The `k` largest values in ascending order
    ///
    /// `k` is clamped to the sequence length, so asking for more values than
    /// were found returns the whole sequence.
    pub fn largest(&self, k: usize) -> &[u64] {
        let k = k.min(self.values.len());
        &self.values[self.values.len() - k..]
    }

    /// Whether the sequence is strictly ascending
    pub fn is_ascending(&self) -> bool {
        self.values.windows(2).all(|w| w[0] < w[1])
    }

    pub fn into_values(self) -> Vec<u64> {
        self.values
    }
}

/// Count phase: report `local_count` to `root`
///
/// Returns the per-rank count table on the root and `None` on every other
/// rank. Doubles as the barrier between local compute and the variable gather.
pub fn exchange_counts<C: Collective + ?Sized>(
    comm: &mut C,
    local_count: u64,
    root: usize,
) -> Result<Option<Vec<u64>>, SearchError> {
    let table = comm.gather(RunPhase::CountExchange, local_count, root)?;
    if let Some(ref counts) = table {
        debug!(rank = comm.rank(), ?counts, "count table received");
    }
    Ok(table)
}

/// Offset phase: turn the coordinator's count table into a [`ResultLayout`]
///
/// `rank` is the coordinator's own rank, used to label a failure.
pub fn compute_offsets(rank: usize, counts: &[u64]) -> Result<ResultLayout, SearchError> {
    compute_layout(counts).ok_or_else(|| SearchError::CollectiveFailure {
        phase: RunPhase::OffsetCompute,
        rank,
        reason: "total result count does not fit in memory".to_string(),
    })
}

/// Variable gather: move every rank's `local` results into the coordinator's buffer
///
/// The root must pass the layout produced by [`compute_offsets`]; other ranks
/// pass `None`. Returns the Global Result Sequence on the root.
pub fn gather_variable<C: Collective + ?Sized>(
    comm: &mut C,
    local: &[u64],
    layout: Option<&ResultLayout>,
    root: usize,
) -> Result<Option<GlobalResultSequence>, SearchError> {
    let buffer = comm.gather_varying(RunPhase::VariableGather, local, layout, root)?;

    match (buffer, layout) {
        (Some(values), Some(layout)) => Ok(Some(GlobalResultSequence::new(layout.clone(), values))),
        (Some(_), None) => Err(SearchError::CollectiveFailure {
            phase: RunPhase::VariableGather,
            rank: comm.rank(),
            reason: "received a gathered buffer without a layout".to_string(),
        }),
        (None, _) => Ok(None),
    }
}
