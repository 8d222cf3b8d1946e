//! In-process cluster launcher
//!
//! Runs one [`Participant`] per OS thread over a collective substrate, waits
//! for every thread, and turns the per-rank outcomes into a single
//! [`RunReport`] or a single root-cause [`SearchError`].
//!
//! Each call builds everything from scratch: a fresh star of channels, fresh participants
//! and fresh buffers. Nothing survives from one run to the next.
//!
//! # Root Cause Selection
//!
//! When one participant fails, the others usually fail too, with `PeerLost`
//! or with the cause the coordinator forwarded to them. The reported error is
//! the first non-secondary error in rank order, falling back to the first
//! error of any kind.

use crate::aggregator::GlobalResultSequence;
use crate::comm::{local, Collective};
use crate::config::validator::validate_config;
use crate::config::Config;
use crate::error::SearchError;
use crate::participant::{read_marker, Participant, ParticipantOutcome, PhaseMarker, RunPhase};
use crate::partition::SubRange;
use crate::predicate::PredicateKind;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Per-rank line of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantSummary {
    pub rank: usize,
    pub range: SubRange,
    pub count: u64,
    /// Where this rank's slice starts in the Global Result Sequence
    pub offset: usize,
    pub compute_time: Duration,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub domain_size: u64,
    pub predicate: PredicateKind,
    pub coordinator: usize,
    /// In rank order
    pub participants: Vec<ParticipantSummary>,
    pub result: GlobalResultSequence,
    pub elapsed: Duration,
}

impl RunReport {
    /// Length of the Global Result Sequence
    pub fn total(&self) -> usize {
        self.result.len()
    }

    /// The `k` largest results, largest first
    pub fn largest_descending(&self, k: usize) -> Vec<u64> {
        self.result.largest(k).iter().rev().copied().collect()
    }
}

/// Validate `config` and run it over a fresh in-memory star
///
/// # Example
///
/// ```
/// use rangesweep::cluster;
/// use rangesweep::config::Config;
/// use std::sync::Arc;
///
/// let report = cluster::run(Arc::new(Config::for_domain(30, 3))).unwrap();
/// assert_eq!(report.result.values(), &[2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
/// assert_eq!(report.largest_descending(3), vec![29, 23, 19]);
/// ```
pub fn run(config: Arc<Config>) -> Result<RunReport, SearchError> {
    validate_config(&config)?;
    let endpoints = local::star(config.cluster.participants, config.cluster.coordinator_rank);
    launch(config, endpoints)
}

/// Validate `config` and run it over caller-supplied endpoints
///
/// `endpoints` must hold one endpoint per configured participant. Their
/// order does not matter; each is bound to the rank it reports.
pub fn run_with<C: Collective + 'static>(
    config: Arc<Config>,
    endpoints: Vec<C>,
) -> Result<RunReport, SearchError> {
    validate_config(&config)?;
    if endpoints.len() != config.cluster.participants {
        return Err(SearchError::config(format!(
            "{} endpoints supplied for {} participants",
            endpoints.len(),
            config.cluster.participants
        )));
    }
    launch(config, endpoints)
}

fn launch<C: Collective + 'static>(
    config: Arc<Config>,
    endpoints: Vec<C>,
) -> Result<RunReport, SearchError> {
    info!(
        domain_size = config.search.domain_size,
        participants = config.cluster.participants,
        coordinator = config.cluster.coordinator_rank,
        predicate = %config.search.predicate,
        "starting search run"
    );
    let started = Instant::now();

    let mut handles = Vec::with_capacity(endpoints.len());
    let mut results: Vec<(usize, Result<ParticipantOutcome, SearchError>)> = Vec::new();

    for comm in endpoints {
        let rank = comm.rank();
        let config = config.clone();
        let marker: PhaseMarker = Arc::new(Mutex::new(RunPhase::Init));
        let shared = marker.clone();
        let spawned = thread::Builder::new()
            .name(format!("participant-{}", rank))
            .spawn(move || Participant::new(comm, config)?.with_phase_marker(shared).run());

        match spawned {
            Ok(handle) => handles.push((rank, marker, handle)),
            // The endpoint was dropped with the closure, so peers see PeerLost
            Err(e) => results.push((
                rank,
                Err(SearchError::CollectiveFailure {
                    phase: RunPhase::Init,
                    rank,
                    reason: format!("failed to spawn participant thread: {}", e),
                }),
            )),
        }
    }

    for (rank, marker, handle) in handles {
        let outcome = handle.join().unwrap_or_else(|_| {
            Err(SearchError::ParticipantPanicked {
                rank,
                phase: read_marker(&marker),
            })
        });
        results.push((rank, outcome));
    }
    results.sort_by_key(|(rank, _)| *rank);

    let mut outcomes = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for (_, result) in results {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => errors.push(e),
        }
    }

    if let Some(cause) = root_cause(errors) {
        error!(error = %cause, phase = %cause.phase(), "search run failed");
        return Err(cause);
    }

    let report = build_report(&config, outcomes, started.elapsed())?;
    info!(
        total = report.total(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "search run complete"
    );
    Ok(report)
}

/// First non-secondary error in rank order, else the first error
fn root_cause(errors: Vec<SearchError>) -> Option<SearchError> {
    let mut errors = errors.into_iter();
    let first = errors.next()?;
    if !first.is_secondary() {
        return Some(first);
    }
    Some(errors.find(|e| !e.is_secondary()).unwrap_or(first))
}

fn build_report(
    config: &Config,
    mut outcomes: Vec<ParticipantOutcome>,
    elapsed: Duration,
) -> Result<RunReport, SearchError> {
    let coordinator = config.cluster.coordinator_rank;

    let result = outcomes
        .iter_mut()
        .find(|o| o.rank == coordinator)
        .and_then(|o| o.result.take())
        .ok_or_else(|| SearchError::CollectiveFailure {
            phase: RunPhase::Done,
            rank: coordinator,
            reason: "coordinator finished without a result".to_string(),
        })?;

    let participants = outcomes
        .iter()
        .map(|o| ParticipantSummary {
            rank: o.rank,
            range: o.range,
            count: o.local_count,
            offset: result.layout().offset(o.rank).unwrap_or(0),
            compute_time: o.compute_time,
        })
        .collect();

    Ok(RunReport {
        domain_size: config.search.domain_size,
        predicate: config.search.predicate,
        coordinator,
        participants,
        result,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::layout::ResultLayout;
    use crate::comm::local::LocalComm;

    #[test]
    fn test_prime_scenario() {
        let report = run(Arc::new(Config::for_domain(30, 3))).unwrap();

        assert_eq!(report.result.values(), &[2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
        assert_eq!(report.total(), 10);
        assert_eq!(report.coordinator, 0);

        let counts: Vec<_> = report.participants.iter().map(|p| p.count).collect();
        let offsets: Vec<_> = report.participants.iter().map(|p| p.offset).collect();
        assert_eq!(counts, vec![4, 4, 2]);
        assert_eq!(offsets, vec![0, 4, 8]);
        assert_eq!(report.largest_descending(10), vec![29, 23, 19, 17, 13, 11, 7, 5, 3, 2]);
    }

    #[test]
    fn test_more_participants_than_elements() {
        let report = run(Arc::new(Config::for_domain(3, 8))).unwrap();

        assert_eq!(report.result.values(), &[2]);
        for summary in &report.participants[3..] {
            assert!(summary.range.is_empty());
            assert_eq!(summary.count, 0);
            assert_eq!(summary.offset, 1);
        }
    }

    #[test]
    fn test_uneven_division() {
        let report = run(Arc::new(Config::for_domain(10, 3))).unwrap();
        let ranges: Vec<_> = report.participants.iter().map(|p| p.range).collect();
        assert_eq!(
            ranges,
            vec![SubRange::new(0, 4), SubRange::new(4, 8), SubRange::new(8, 10)]
        );
        assert_eq!(report.result.values(), &[2, 3, 5, 7]);
    }

    #[test]
    fn test_empty_domain() {
        let report = run(Arc::new(Config::for_domain(0, 4))).unwrap();
        assert!(report.result.is_empty());
        assert!(report.largest_descending(10).is_empty());
    }

    #[test]
    fn test_idempotent_runs() {
        let config = Arc::new(Config::for_domain(5_000, 7));
        let first = run(config.clone()).unwrap();
        let second = run(config).unwrap();
        assert_eq!(first.result, second.result);
        assert!(first.result.is_ascending());
    }

    #[test]
    fn test_sharded_participants_match_single_threaded() {
        let single = run(Arc::new(Config::for_domain(20_000, 3))).unwrap();

        let mut config = Config::for_domain(20_000, 3);
        config.cluster.threads_per_participant = 4;
        let sharded = run(Arc::new(config)).unwrap();

        assert_eq!(single.result.values(), sharded.result.values());
    }

    #[test]
    fn test_non_zero_coordinator() {
        let mut config = Config::for_domain(30, 3);
        config.cluster.coordinator_rank = 2;
        let report = run(Arc::new(config)).unwrap();
        assert_eq!(report.coordinator, 2);
        assert_eq!(report.result.values(), &[2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
    }

    #[test]
    fn test_injected_fault_reports_root_cause() {
        let mut endpoints = local::star(3, 0);
        let faulty = endpoints.remove(1).fail_at(RunPhase::CountExchange);
        endpoints.insert(1, faulty);

        let err = run_with(Arc::new(Config::for_domain(30, 3)), endpoints).unwrap_err();
        assert_eq!(
            err,
            SearchError::CollectiveFailure {
                phase: RunPhase::CountExchange,
                rank: 1,
                reason: "injected fault".to_string(),
            }
        );
        assert_eq!(err.phase(), RunPhase::CountExchange);
    }

    #[test]
    fn test_broadcast_fault_on_coordinator() {
        let mut endpoints = local::star(4, 0);
        let root = endpoints.remove(0).fail_at(RunPhase::DomainBroadcast);
        endpoints.insert(0, root);

        let err = run_with(Arc::new(Config::for_domain(30, 4)), endpoints).unwrap_err();
        assert!(matches!(
            err,
            SearchError::CollectiveFailure { phase: RunPhase::DomainBroadcast, rank: 0, .. }
        ));
    }

    #[test]
    fn test_truncated_payload_is_protocol_violation() {
        let mut endpoints = local::star(3, 0);
        let short = endpoints.remove(2).drop_payload_tail(1);
        endpoints.push(short);

        let err = run_with(Arc::new(Config::for_domain(30, 3)), endpoints).unwrap_err();
        assert_eq!(
            err,
            SearchError::ProtocolViolation {
                phase: RunPhase::VariableGather,
                rank: 2,
                declared: 2,
                actual: 1,
            }
        );
    }

    #[test]
    fn test_configuration_error_before_any_phase() {
        let err = run(Arc::new(Config::for_domain(30, 0))).unwrap_err();
        assert!(matches!(err, SearchError::Configuration(_)));
        assert_eq!(err.phase(), RunPhase::Init);

        let err = run_with(Arc::new(Config::for_domain(30, 3)), local::star(2, 0)).unwrap_err();
        assert!(matches!(err, SearchError::Configuration(_)));
    }

    #[test]
    fn test_endpoints_wired_to_another_root() {
        let mut config = Config::for_domain(30, 3);
        config.cluster.coordinator_rank = 1;
        let err = run_with(Arc::new(config), local::star(3, 0)).unwrap_err();
        assert!(matches!(
            err,
            SearchError::CollectiveFailure { phase: RunPhase::DomainBroadcast, .. }
        ));
    }

    #[test]
    fn test_many_participants_over_star() {
        let report = run(Arc::new(Config::for_domain(1_000, 200))).unwrap();
        assert_eq!(report.participants.len(), 200);
        assert_eq!(report.total(), 168);
        assert_eq!(report.largest_descending(1), vec![997]);
    }

    /// Endpoint that panics on entering the count exchange
    struct PanickingComm {
        inner: LocalComm,
        panic: bool,
    }

    impl Collective for PanickingComm {
        fn rank(&self) -> usize {
            self.inner.rank()
        }

        fn size(&self) -> usize {
            self.inner.size()
        }

        fn broadcast(&mut self, tag: RunPhase, value: u64, root: usize) -> Result<u64, SearchError> {
            self.inner.broadcast(tag, value, root)
        }

        fn gather(&mut self, tag: RunPhase, value: u64, root: usize) -> Result<Option<Vec<u64>>, SearchError> {
            if self.panic {
                panic!("participant {} crashed", self.inner.rank());
            }
            self.inner.gather(tag, value, root)
        }

        fn gather_varying(
            &mut self,
            tag: RunPhase,
            local: &[u64],
            layout: Option<&ResultLayout>,
            root: usize,
        ) -> Result<Option<Vec<u64>>, SearchError> {
            self.inner.gather_varying(tag, local, layout, root)
        }
    }

    #[test]
    fn test_panicked_participant() {
        let endpoints: Vec<_> = local::star(3, 0)
            .into_iter()
            .map(|inner| {
                let panic = inner.rank() == 2;
                PanickingComm { inner, panic }
            })
            .collect();

        let err = run_with(Arc::new(Config::for_domain(30, 3)), endpoints).unwrap_err();
        assert_eq!(
            err,
            SearchError::ParticipantPanicked {
                rank: 2,
                phase: RunPhase::CountExchange,
            }
        );
        assert!(err.to_string().contains("COUNT_EXCHANGE"));
    }

    #[test]
    fn test_root_cause_prefers_primary_errors() {
        let lost = SearchError::PeerLost { phase: RunPhase::CountExchange, rank: 0, peer: 1 };
        let primary = SearchError::config("boom");

        assert_eq!(root_cause(vec![]), None);
        assert_eq!(root_cause(vec![lost.clone()]), Some(lost.clone()));
        assert_eq!(root_cause(vec![lost.clone(), primary.clone()]), Some(primary));
    }
}
