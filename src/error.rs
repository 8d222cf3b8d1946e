//! Error taxonomy for a search run
//!
//! Every failure at this layer is fatal for the whole run. Nothing here is
//! retried; the caller decides whether to start a fresh run.

use crate::participant::RunPhase;
use thiserror::Error;

/// Fatal run error
///
/// A failed run never exposes a partial Global Result Sequence. Each variant
/// except `Configuration` records the phase in which it was raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Invalid domain size, participant count, rank or predicate parameter.
    ///
    /// Detected before any collective phase starts.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A collective primitive reported non-success on `rank`.
    #[error("collective failure during {phase} on rank {rank}: {reason}")]
    CollectiveFailure {
        phase: RunPhase,
        rank: usize,
        reason: String,
    },

    /// `rank` lost its channel to `peer` while inside a collective.
    ///
    /// This is a collective failure that is almost always a consequence of
    /// another participant failing first.
    #[error("rank {rank} lost contact with rank {peer} during {phase}")]
    PeerLost {
        phase: RunPhase,
        rank: usize,
        peer: usize,
    },

    /// A participant's declared count differs from the length it transferred.
    #[error(
        "protocol violation during {phase}: rank {rank} declared {declared} elements but transferred {actual}"
    )]
    ProtocolViolation {
        phase: RunPhase,
        rank: usize,
        declared: u64,
        actual: u64,
    },

    /// A participant thread panicked before reporting an outcome.
    ///
    /// `phase` is the last phase the participant entered.
    #[error("participant {rank} panicked during {phase}")]
    ParticipantPanicked { rank: usize, phase: RunPhase },
}

impl SearchError {
    /// Build a configuration error from any displayable message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Phase in which the run failed
    ///
    /// Configuration errors are raised before any collective and report `INIT`.
    pub fn phase(&self) -> RunPhase {
        match self {
            Self::Configuration(_) => RunPhase::Init,
            Self::CollectiveFailure { phase, .. }
            | Self::PeerLost { phase, .. }
            | Self::ProtocolViolation { phase, .. }
            | Self::ParticipantPanicked { phase, .. } => *phase,
        }
    }

    /// True for failures that only echo another participant's failure
    pub fn is_secondary(&self) -> bool {
        matches!(self, Self::PeerLost { .. })
    }
}
