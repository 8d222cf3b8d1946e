//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;

use crate::predicate::PredicateKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Complete run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl Config {
    /// Prime search over `[0, domain_size)` with `participants` ranks and
    /// every other setting at its default
    pub fn for_domain(domain_size: u64, participants: usize) -> Self {
        Self {
            search: SearchConfig {
                domain_size,
                predicate: PredicateKind::default(),
            },
            cluster: ClusterConfig {
                participants,
                ..ClusterConfig::default()
            },
            output: OutputConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

/// What to search for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Domain is `[0, domain_size)`
    pub domain_size: u64,
    /// Membership test applied to every element
    #[serde(default)]
    pub predicate: PredicateKind,
}

/// Participant group layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Number of participants (P)
    #[serde(default = "default_participants")]
    pub participants: usize,
    /// Rank that computes offsets and owns the result
    #[serde(default)]
    pub coordinator_rank: usize,
    /// Scan shards per participant
    #[serde(default = "default_threads")]
    pub threads_per_participant: usize,
}

fn default_participants() -> usize {
    num_cpus::get()
}

fn default_threads() -> usize {
    1
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            participants: default_participants(),
            coordinator_rank: 0,
            threads_per_participant: default_threads(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// How many of the largest results to display
    #[serde(default = "default_display_count")]
    pub display_count: usize,
    /// Print the per-participant count table
    #[serde(default = "default_show_counts")]
    pub show_counts: bool,
    /// Print the full Global Result Sequence
    #[serde(default)]
    pub print_all: bool,
    /// JSON report file path
    pub json_output: Option<PathBuf>,
}

fn default_display_count() -> usize {
    10
}

fn default_show_counts() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            display_count: default_display_count(),
            show_counts: default_show_counts(),
            print_all: false,
            json_output: None,
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Validate and print the plan without running
    #[serde(default)]
    pub dry_run: bool,
    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration:")?;
        writeln!(f, "  Search: {}", self.search)?;
        writeln!(f, "  Cluster: {}", self.cluster)?;
        write!(f, "  Display: largest {}", self.output.display_count)?;
        if self.output.print_all {
            write!(f, ", full sequence")?;
        }
        Ok(())
    }
}

impl fmt::Display for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in [0, {})", self.predicate, self.domain_size)
    }
}

impl fmt::Display for ClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} participant(s), coordinator rank {}, {} thread(s) each",
            self.participants, self.coordinator_rank, self.threads_per_participant
        )
    }
}
