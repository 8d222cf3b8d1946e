//! RangeSweep CLI entry point

use anyhow::{Context, Result};
use rangesweep::cluster;
use rangesweep::config::{cli::Cli, toml::load_config, validator::validate_config};
use rangesweep::output::{json, text};
use rangesweep::util::logging::init_logging;
use std::sync::Arc;

fn main() -> Result<()> {
    println!("RangeSweep v{}", env!("CARGO_PKG_VERSION"));
    println!("Range-partitioned parallel search");
    println!();

    // Parse CLI arguments
    let cli = Cli::parse_args();
    cli.validate()?;

    let config = load_config(&cli)?;
    init_logging(config.runtime.debug);

    validate_config(&config).context("Configuration validation failed")?;

    text::print_configuration(&config);

    if config.runtime.dry_run {
        text::print_plan(&config);
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    let config = Arc::new(config);
    let report = cluster::run(config.clone()).map_err(|e| {
        let phase = e.phase();
        anyhow::Error::new(e).context(format!("Search run failed during {}", phase))
    })?;

    text::print_report(&report, &config);

    if let Some(path) = &config.output.json_output {
        let json_report = json::build_report(&report, &config);
        json::write_json_output(path, &json_report)?;
        println!("JSON report written to {}", path.display());
    }

    Ok(())
}
