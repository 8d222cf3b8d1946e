//! CLI to Config conversion utilities

use crate::config::cli::{Cli, PredicateArg};
use crate::config::{ClusterConfig, Config, OutputConfig, RuntimeConfig, SearchConfig};
use crate::error::SearchError;
use crate::predicate::PredicateKind;
use anyhow::{Context, Result};

/// Parse a count string (e.g., "1000", "1_000_000", "10k", "5m", "2g")
///
/// Suffixes are decimal: k = 10^3, m = 10^6, g = 10^9, t = 10^12.
pub fn parse_count(s: &str) -> Result<u64, SearchError> {
    let s = s.trim().to_lowercase().replace('_', "");

    if s.starts_with('-') {
        return Err(SearchError::config(format!("count must not be negative: {}", s)));
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('k') {
        (n, 1_000u64)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 1_000_000)
    } else if let Some(n) = s.strip_suffix('g') {
        (n, 1_000_000_000)
    } else if let Some(n) = s.strip_suffix('t') {
        (n, 1_000_000_000_000)
    } else {
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| SearchError::config(format!("invalid count format: {}", s)))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| SearchError::config(format!("count does not fit in 64 bits: {}", s)))
}

/// Convert CLI predicate selection to PredicateKind
pub fn convert_predicate(arg: PredicateArg, divisor: Option<u64>) -> Result<PredicateKind, SearchError> {
    match arg {
        PredicateArg::Prime => Ok(PredicateKind::Prime),
        PredicateArg::PerfectSquare => Ok(PredicateKind::PerfectSquare),
        PredicateArg::MultipleOf => {
            let divisor = divisor
                .ok_or_else(|| SearchError::config("multiple-of requires a divisor"))?;
            Ok(PredicateKind::MultipleOf { divisor })
        }
    }
}

/// Build a Config from CLI arguments alone
pub fn build_config_from_cli(cli: &Cli) -> Result<Config> {
    let max = cli.max.as_deref().context("MAX is required without --config")?;
    let domain_size = parse_count(max).context("Invalid MAX")?;

    let predicate = match cli.predicate {
        Some(arg) => convert_predicate(arg, cli.divisor)?,
        None => PredicateKind::default(),
    };

    let defaults = ClusterConfig::default();
    let output_defaults = OutputConfig::default();

    Ok(Config {
        search: SearchConfig {
            domain_size,
            predicate,
        },
        cluster: ClusterConfig {
            participants: cli.participants.unwrap_or(defaults.participants),
            coordinator_rank: cli.coordinator_rank.unwrap_or(defaults.coordinator_rank),
            threads_per_participant: cli.threads.unwrap_or(defaults.threads_per_participant),
        },
        output: OutputConfig {
            display_count: cli.display_count.unwrap_or(output_defaults.display_count),
            show_counts: !cli.no_counts,
            print_all: cli.print_all,
            json_output: cli.json_output.clone(),
        },
        runtime: RuntimeConfig {
            dry_run: cli.dry_run,
            debug: cli.debug,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_count_plain() {
        assert_eq!(parse_count("1000").unwrap(), 1000);
        assert_eq!(parse_count("0").unwrap(), 0);
        assert_eq!(parse_count(" 42 ").unwrap(), 42);
    }

    #[test]
    fn test_parse_count_separators() {
        assert_eq!(parse_count("1_000_000").unwrap(), 1_000_000);
    }

    #[test]
    fn test_parse_count_suffixes() {
        assert_eq!(parse_count("10k").unwrap(), 10_000);
        assert_eq!(parse_count("5M").unwrap(), 5_000_000);
        assert_eq!(parse_count("2g").unwrap(), 2_000_000_000);
        assert_eq!(parse_count("1t").unwrap(), 1_000_000_000_000);
    }

    #[test]
    fn test_parse_count_rejects_bad_input() {
        assert!(matches!(parse_count("-5"), Err(SearchError::Configuration(_))));
        assert!(parse_count("abc").is_err());
        assert!(parse_count("").is_err());
        assert!(parse_count("1.5k").is_err());
        assert!(parse_count("99999999999t").is_err());
    }

    #[test]
    fn test_convert_predicate() {
        assert_eq!(convert_predicate(PredicateArg::Prime, None).unwrap(), PredicateKind::Prime);
        assert_eq!(
            convert_predicate(PredicateArg::MultipleOf, Some(4)).unwrap(),
            PredicateKind::MultipleOf { divisor: 4 }
        );
        assert!(convert_predicate(PredicateArg::MultipleOf, None).is_err());
    }

    #[test]
    fn test_build_config_from_cli() {
        let cli = Cli::try_parse_from([
            "rangesweep",
            "10k",
            "-p",
            "3",
            "--coordinator-rank",
            "2",
            "--predicate",
            "multiple-of",
            "--divisor",
            "7",
            "--no-counts",
            "--display-count",
            "5",
        ])
        .unwrap();

        let config = build_config_from_cli(&cli).unwrap();
        assert_eq!(config.search.domain_size, 10_000);
        assert_eq!(config.search.predicate, PredicateKind::MultipleOf { divisor: 7 });
        assert_eq!(config.cluster.participants, 3);
        assert_eq!(config.cluster.coordinator_rank, 2);
        assert_eq!(config.cluster.threads_per_participant, 1);
        assert_eq!(config.output.display_count, 5);
        assert!(!config.output.show_counts);
    }

    #[test]
    fn test_build_config_rejects_negative_max() {
        let cli = Cli::try_parse_from(["rangesweep", "-10"]).unwrap();
        assert!(build_config_from_cli(&cli).is_err());
    }
}
