//! CLI argument parsing using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Predicate selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PredicateArg {
    /// Prime numbers
    Prime,
    /// Perfect squares
    PerfectSquare,
    /// Multiples of --divisor
    MultipleOf,
}

/// RangeSweep - range-partitioned parallel search
#[derive(Parser, Debug)]
#[command(name = "rangesweep")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Domain size: search [0, MAX) (e.g., 1000, 10k, 5m, 2g)
    ///
    /// Optional when --config supplies search.domain_size
    #[arg(value_name = "MAX", allow_negative_numbers = true)]
    pub max: Option<String>,

    /// TOML configuration file (CLI flags override its values)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    // === Cluster Options ===
    /// Number of participants (default: number of CPUs)
    #[arg(short = 'p', long, env = "RANGESWEEP_PARTICIPANTS")]
    pub participants: Option<usize>,

    /// Rank that computes offsets and owns the result
    #[arg(long)]
    pub coordinator_rank: Option<usize>,

    /// Scan threads per participant (1-1024)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    // === Search Options ===
    /// Predicate applied to every element
    #[arg(long, value_enum)]
    pub predicate: Option<PredicateArg>,

    /// Divisor for --predicate multiple-of
    #[arg(long)]
    pub divisor: Option<u64>,

    // === Output Options ===
    /// Number of largest results to display
    #[arg(long)]
    pub display_count: Option<usize>,

    /// Hide the per-participant count table
    #[arg(long)]
    pub no_counts: bool,

    /// Print the complete result sequence
    #[arg(long)]
    pub print_all: bool,

    /// Write a JSON report to FILE
    #[arg(long, value_name = "FILE")]
    pub json_output: Option<PathBuf>,

    // === Runtime Options ===
    /// Validate and print the plan without running
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max.is_none() && self.config.is_none() {
            anyhow::bail!("must specify MAX or --config");
        }

        if self.participants == Some(0) {
            anyhow::bail!("participants must be at least 1");
        }

        if let Some(threads) = self.threads {
            if threads == 0 || threads > 1024 {
                anyhow::bail!("threads must be between 1 and 1024");
            }
        }

        match (self.predicate, self.divisor) {
            (Some(PredicateArg::MultipleOf), None) => {
                anyhow::bail!("--predicate multiple-of requires --divisor");
            }
            (Some(PredicateArg::MultipleOf), Some(0)) => {
                anyhow::bail!("divisor must be non-zero");
            }
            (Some(PredicateArg::MultipleOf), Some(_)) | (Some(_), None) | (None, _) => {}
            (Some(_), Some(_)) => {
                anyhow::bail!("--divisor only applies to --predicate multiple-of");
            }
        }

        Ok(())
    }
}
