//! TOML configuration file parsing

use super::*;
use crate::config::cli::Cli;
use crate::config::cli_convert::{build_config_from_cli, convert_predicate, parse_count};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    if let Some(max) = &cli.max {
        config.search.domain_size = parse_count(max).context("Invalid MAX")?;
    }

    if let Some(arg) = cli.predicate {
        config.search.predicate = convert_predicate(arg, cli.divisor)?;
    } else if let (Some(divisor), PredicateKind::MultipleOf { .. }) = (cli.divisor, config.search.predicate) {
        config.search.predicate = PredicateKind::MultipleOf { divisor };
    }

    if let Some(participants) = cli.participants {
        config.cluster.participants = participants;
    }
    if let Some(rank) = cli.coordinator_rank {
        config.cluster.coordinator_rank = rank;
    }
    if let Some(threads) = cli.threads {
        config.cluster.threads_per_participant = threads;
    }

    if let Some(count) = cli.display_count {
        config.output.display_count = count;
    }
    if cli.no_counts {
        config.output.show_counts = false;
    }
    if cli.print_all {
        config.output.print_all = true;
    }
    if cli.json_output.is_some() {
        config.output.json_output = cli.json_output.clone();
    }

    if cli.dry_run {
        config.runtime.dry_run = true;
    }
    if cli.debug {
        config.runtime.debug = true;
    }

    Ok(config)
}

/// Resolve the effective configuration: file (if any) overlaid with CLI flags
pub fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => {
            let config = parse_toml_file(path)?;
            merge_cli_with_config(cli, config)
        }
        None => build_config_from_cli(cli),
    }
}
