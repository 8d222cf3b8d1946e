//! Collective communication substrate
//!
//! This module defines the only channel participants use to coordinate. The
//! search core treats it as a set of opaque, synchronous collective
//! operations; how bytes actually move is up to the implementation.
//!
//! # Primitives
//!
//! - `broadcast`: the root's scalar is delivered to every rank
//! - `gather`: one fixed-size record per rank, collected on the root
//! - `gather_varying`: variable-length slices written into one buffer on the
//!   root, each at the offset the root's [`ResultLayout`] reserves for it
//!
//! Each call is a rendezvous. `gather` and `gather_varying` do not return on
//! any rank until the root holds the complete result, so no rank can start the
//! next phase while another is still reporting.
//!
//! # Implementations
//!
//! - [`local::LocalComm`]: in-process star of crossbeam channels around the root, one endpoint
//!   per participant thread. Supports fault injection for tests.
//!
//! # Example
//!
//! ```
//! use rangesweep::comm::{local, Collective};
//! use rangesweep::participant::RunPhase;
//!
//! let handles: Vec<_> = local::star(3, 0)
//!     .into_iter()
//!     .map(|mut comm| {
//!         std::thread::spawn(move || {
//!             let value = comm.broadcast(RunPhase::DomainBroadcast, 42, 0).unwrap();
//!             comm.gather(RunPhase::CountExchange, value + comm.rank() as u64, 0).unwrap()
//!         })
//!     })
//!     .collect();
//!
//! let tables: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
//! assert_eq!(tables[0], Some(vec![42, 43, 44]));
//! assert_eq!(tables[1], None);
//! ```

use crate::aggregator::layout::ResultLayout;
use crate::error::SearchError;
use crate::participant::RunPhase;

pub mod local;

/// Synchronous collective operations over a fixed group of ranks
///
/// Every rank of the group must call the same primitive, with the same `tag`
/// and `root`, in the same order. The `tag` names the run phase the call
/// belongs to; implementations use it to label errors and to reject messages
/// that belong to a different phase.
///
/// # Thread Safety
///
/// Endpoints must be `Send` so each participant thread can own one. They are
/// not shared between threads.
///
/// # Error Handling
///
/// Any failure is fatal for the run. Implementations must not return partial
/// results.
pub trait Collective: Send {
    /// This endpoint's rank in `[0, size)`
    fn rank(&self) -> usize;

    /// Number of ranks in the group
    fn size(&self) -> usize;

    /// Deliver `value` from `root` to every rank
    ///
    /// The value passed by non-root ranks is ignored. Returns the root's value
    /// on every rank.
    fn broadcast(&mut self, tag: RunPhase, value: u64, root: usize) -> Result<u64, SearchError>;

    /// Collect one `u64` from every rank on `root`
    ///
    /// Returns `Some(table)` indexed by rank on the root, `None` elsewhere.
    fn gather(&mut self, tag: RunPhase, value: u64, root: usize) -> Result<Option<Vec<u64>>, SearchError>;

    /// Collect every rank's slice into one contiguous buffer on `root`
    ///
    /// Only the root supplies `layout`; rank `r`'s slice lands at
    /// `layout.slot(r)`. A slice whose length differs from the count declared
    /// in the layout is a `ProtocolViolation`.
    fn gather_varying(
        &mut self,
        tag: RunPhase,
        local: &[u64],
        layout: Option<&ResultLayout>,
        root: usize,
    ) -> Result<Option<Vec<u64>>, SearchError>;
}
