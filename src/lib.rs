//! RangeSweep - range-partitioned parallel search
//!
//! RangeSweep splits the integer domain `[0, N)` across `P` symmetric
//! participants, lets each scan its own sub-range with a pluggable predicate,
//! and rebuilds one globally ordered result sequence on a coordinator without
//! any participant talking to another directly.
//!
//! # Architecture
//!
//! - **Partitioner**: deterministic, rank-ordered half-open sub-ranges
//! - **Predicates**: prime, perfect square, multiple-of; sharded over rayon
//! - **Collective substrate**: broadcast / gather / variable gather behind a trait
//! - **Aggregator**: count exchange, offset prefix sum, variable-length gather
//! - **Cluster**: one thread per participant, fail-fast with root-cause errors
//!
//! Because sub-ranges are assigned in increasing rank order and every local
//! result set is ascending, the rank-ordered concatenation is already sorted.

pub mod aggregator;
pub mod cluster;
pub mod comm;
pub mod config;
pub mod error;
pub mod output;
pub mod participant;
pub mod partition;
pub mod predicate;
pub mod util;

// Re-export commonly used types
pub use aggregator::GlobalResultSequence;
pub use cluster::RunReport;
pub use comm::Collective;
pub use config::Config;
pub use error::SearchError;
pub use participant::RunPhase;
pub use partition::{partition, SubRange};

/// Result type used at the binary and file-loading edges
pub type Result<T> = anyhow::Result<T>;
