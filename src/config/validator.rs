//! Configuration validation
//!
//! Runs before any collective phase, so every error here is a
//! `SearchError::Configuration`.

use super::*;
use crate::error::SearchError;
use tracing::warn;

/// Upper bound on participants in one run
pub const MAX_PARTICIPANTS: usize = 4096;

/// Upper bound on scan threads per participant
pub const MAX_THREADS_PER_PARTICIPANT: usize = 1024;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<(), SearchError> {
    validate_search(&config.search)?;
    validate_cluster(&config.cluster)?;
    validate_output(&config.output)?;

    if (config.cluster.participants as u64) > config.search.domain_size {
        warn!(
            participants = config.cluster.participants,
            domain_size = config.search.domain_size,
            "more participants than domain elements, trailing ranks will scan empty ranges"
        );
    }

    Ok(())
}

/// Validate search configuration
pub fn validate_search(search: &SearchConfig) -> Result<(), SearchError> {
    if let PredicateKind::MultipleOf { divisor: 0 } = search.predicate {
        return Err(SearchError::config("search.predicate divisor must be non-zero"));
    }

    Ok(())
}

/// Validate cluster configuration
pub fn validate_cluster(cluster: &ClusterConfig) -> Result<(), SearchError> {
    if cluster.participants == 0 || cluster.participants > MAX_PARTICIPANTS {
        return Err(SearchError::config(format!(
            "cluster.participants must be between 1 and {} (got {})",
            MAX_PARTICIPANTS, cluster.participants
        )));
    }

    if cluster.coordinator_rank >= cluster.participants {
        return Err(SearchError::config(format!(
            "cluster.coordinator_rank {} must be less than participants {}",
            cluster.coordinator_rank, cluster.participants
        )));
    }

    if cluster.threads_per_participant == 0 || cluster.threads_per_participant > MAX_THREADS_PER_PARTICIPANT {
        return Err(SearchError::config(format!(
            "cluster.threads_per_participant must be between 1 and {} (got {})",
            MAX_THREADS_PER_PARTICIPANT, cluster.threads_per_participant
        )));
    }

    let total_threads = cluster.participants.saturating_mul(cluster.threads_per_participant);
    if total_threads > num_cpus::get() * 4 {
        warn!(
            total_threads,
            cpus = num_cpus::get(),
            "thread count far exceeds available CPUs"
        );
    }

    Ok(())
}

/// Validate output configuration
pub fn validate_output(output: &OutputConfig) -> Result<(), SearchError> {
    if let Some(path) = &output.json_output {
        if path.as_os_str().is_empty() {
            return Err(SearchError::config("output.json_output must not be empty"));
        }
    }

    Ok(())
}
