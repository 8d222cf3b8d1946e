//! Per-rank run state machine
//!
//! Every participant executes the same code; the coordinator is simply the
//! rank whose `is_coordinator()` is true, which gates offset computation and
//! ownership of the final buffer. There is no separate coordinator type.
//!
//! # Phases
//!
//! ```text
//! INIT -> DOMAIN_BROADCAST -> LOCAL_COMPUTE -> COUNT_EXCHANGE
//!      -> (coordinator only: OFFSET_COMPUTE) -> VARIABLE_GATHER -> DONE
//! ```
//!
//! Phases only move forward. The count exchange is a rendezvous, so no rank
//! enters `VARIABLE_GATHER` while another is still reporting its count.
//!
//! # Example
//!
//! ```
//! use rangesweep::comm::local;
//! use rangesweep::config::Config;
//! use rangesweep::participant::Participant;
//! use std::sync::Arc;
//!
//! let config = Arc::new(Config::for_domain(30, 3));
//!
//! let handles: Vec<_> = local::star(3, 0)
//!     .into_iter()
//!     .map(|comm| {
//!         let config = config.clone();
//!         std::thread::spawn(move || Participant::new(comm, config)?.run())
//!     })
//!     .collect();
//!
//! let outcomes: Vec<_> = handles
//!     .into_iter()
//!     .map(|h| h.join().unwrap().unwrap())
//!     .collect();
//!
//! let global = outcomes[0].result.as_ref().unwrap();
//! assert_eq!(global.values(), &[2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
//! assert!(outcomes[1].result.is_none());
//! ```

use crate::aggregator::{self, GlobalResultSequence};
use crate::comm::Collective;
use crate::config::Config;
use crate::error::SearchError;
use crate::partition::{partition, SubRange};
use crate::predicate::{scan_range, Predicate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info_span};

/// Lock-step phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunPhase {
    Init,
    DomainBroadcast,
    LocalCompute,
    CountExchange,
    OffsetCompute,
    VariableGather,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "INIT",
            Self::DomainBroadcast => "DOMAIN_BROADCAST",
            Self::LocalCompute => "LOCAL_COMPUTE",
            Self::CountExchange => "COUNT_EXCHANGE",
            Self::OffsetCompute => "OFFSET_COMPUTE",
            Self::VariableGather => "VARIABLE_GATHER",
            Self::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Shared cell holding the last phase a participant entered
///
/// Outlives the participant, so the phase can still be read after its thread
/// panics.
pub type PhaseMarker = Arc<Mutex<RunPhase>>;

/// What one rank reports after reaching `DONE`
#[derive(Debug, Clone)]
pub struct ParticipantOutcome {
    pub rank: usize,

    /// Sub-range this rank scanned
    pub range: SubRange,

    /// Length of this rank's local result set
    pub local_count: u64,

    /// Wall time of the local compute phase
    pub compute_time: Duration,

    /// Phases entered, in order
    pub trace: Vec<RunPhase>,

    /// Global Result Sequence, `Some` on the coordinator only
    pub result: Option<GlobalResultSequence>,
}

/// One rank of a search run
///
/// Owns its collective endpoint for the whole run. A `Participant` is used
/// once: `run()` consumes it, so no state can leak into a later run.
pub struct Participant<C: Collective> {
    comm: C,
    config: Arc<Config>,
    predicate: Box<dyn Predicate>,
    phase: RunPhase,
    trace: Vec<RunPhase>,
    marker: Option<PhaseMarker>,
}

impl<C: Collective> Participant<C> {
    /// Bind an endpoint to a run configuration
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Configuration` if the endpoint's group size does
    /// not match `cluster.participants`, if the coordinator rank is outside the
    /// group, or if the predicate cannot be built.
    pub fn new(comm: C, config: Arc<Config>) -> Result<Self, SearchError> {
        if comm.size() != config.cluster.participants {
            return Err(SearchError::config(format!(
                "endpoint group has {} ranks but {} participants are configured",
                comm.size(),
                config.cluster.participants
            )));
        }
        if config.cluster.coordinator_rank >= comm.size() {
            return Err(SearchError::config(format!(
                "coordinator rank {} is outside the group of {}",
                config.cluster.coordinator_rank,
                comm.size()
            )));
        }

        let predicate = config.search.predicate.build()?;

        Ok(Self {
            comm,
            config,
            predicate,
            phase: RunPhase::Init,
            trace: vec![RunPhase::Init],
            marker: None,
        })
    }

    /// Mirror every phase transition into `marker`
    pub fn with_phase_marker(mut self, marker: PhaseMarker) -> Self {
        set_marker(&marker, self.phase);
        self.marker = Some(marker);
        self
    }

    pub fn rank(&self) -> usize {
        self.comm.rank()
    }

    pub fn is_coordinator(&self) -> bool {
        self.comm.rank() == self.config.cluster.coordinator_rank
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    fn advance(&mut self, next: RunPhase) {
        debug_assert!(next > self.phase, "phase moved backwards: {} -> {}", self.phase, next);
        debug!(from = %self.phase, to = %next, "phase transition");
        self.phase = next;
        self.trace.push(next);
        if let Some(marker) = &self.marker {
            set_marker(marker, next);
        }
    }

    /// Drive this rank from `INIT` to `DONE`
    ///
    /// Every rank of the group must call `run()` concurrently. Any error is
    /// fatal for the whole run and no partial result is returned.
    pub fn run(mut self) -> Result<ParticipantOutcome, SearchError> {
        let rank = self.comm.rank();
        let size = self.comm.size();
        let root = self.config.cluster.coordinator_rank;

        let span = info_span!("participant", rank);
        let _guard = span.enter();

        // Only the coordinator knows the domain up front
        self.advance(RunPhase::DomainBroadcast);
        let proposed = if self.is_coordinator() {
            self.config.search.domain_size
        } else {
            0
        };
        let domain_size = self.comm.broadcast(RunPhase::DomainBroadcast, proposed, root)?;

        self.advance(RunPhase::LocalCompute);
        let range = partition(domain_size, size, rank)?;
        let started = Instant::now();
        let local = scan_range(
            self.predicate.as_ref(),
            range,
            self.config.cluster.threads_per_participant,
        );
        let compute_time = started.elapsed();
        let local_count = local.len() as u64;
        debug!(%range, local_count, predicate = self.predicate.name(), "local compute finished");

        self.advance(RunPhase::CountExchange);
        let counts = aggregator::exchange_counts(&mut self.comm, local_count, root)?;

        let layout = match counts {
            Some(counts) => {
                self.advance(RunPhase::OffsetCompute);
                Some(aggregator::compute_offsets(rank, &counts)?)
            }
            None => None,
        };

        self.advance(RunPhase::VariableGather);
        let result = aggregator::gather_variable(&mut self.comm, &local, layout.as_ref(), root)?;

        self.advance(RunPhase::Done);

        Ok(ParticipantOutcome {
            rank,
            range,
            local_count,
            compute_time,
            trace: self.trace,
            result,
        })
    }
}

/// Read the phase recorded in `marker`, ignoring poisoning
pub fn read_marker(marker: &PhaseMarker) -> RunPhase {
    *marker.lock().unwrap_or_else(|e| e.into_inner())
}

fn set_marker(marker: &PhaseMarker, phase: RunPhase) {
    *marker.lock().unwrap_or_else(|e| e.into_inner()) = phase;
}
