//! JSON output formatting
//!
//! One report per run, written after the coordinator holds the complete
//! Global Result Sequence. A failed run writes nothing.

use crate::cluster::{ParticipantSummary, RunReport};
use crate::config::Config;
use crate::Result;
use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;

/// Duration with both microseconds and human-readable format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDuration {
    pub micros: u64,
    pub human: String,
}

impl JsonDuration {
    pub fn from_duration(d: Duration) -> Self {
        let micros = d.as_micros() as u64;
        let human = format_duration_human(d);
        Self { micros, human }
    }
}

/// Searched domain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDomain {
    pub start: u64,
    pub end: u64,
}

/// One participant's contribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonParticipant {
    pub rank: usize,
    pub start: u64,
    pub end: u64,
    pub count: u64,
    pub offset: usize,
    pub compute_time: JsonDuration,
}

impl From<&ParticipantSummary> for JsonParticipant {
    fn from(p: &ParticipantSummary) -> Self {
        Self {
            rank: p.rank,
            start: p.range.start,
            end: p.range.end,
            count: p.count,
            offset: p.offset,
            compute_time: JsonDuration::from_duration(p.compute_time),
        }
    }
}

/// Complete JSON report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    pub domain: JsonDomain,
    pub predicate: String,
    pub coordinator: usize,
    pub elapsed: JsonDuration,
    pub participants: Vec<JsonParticipant>,
    pub total: usize,
    /// Largest results, largest first
    pub largest: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<u64>>,
}

/// Build the JSON report for a completed run
pub fn build_report(report: &RunReport, config: &Config) -> JsonReport {
    let hostname = hostname::get()
        .ok()
        .map(|h| h.to_string_lossy().to_string());

    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        hostname,
        domain: JsonDomain {
            start: 0,
            end: report.domain_size,
        },
        predicate: report.predicate.to_string(),
        coordinator: report.coordinator,
        elapsed: JsonDuration::from_duration(report.elapsed),
        participants: report.participants.iter().map(JsonParticipant::from).collect(),
        total: report.total(),
        largest: report.largest_descending(config.output.display_count),
        values: config
            .output
            .print_all
            .then(|| report.result.values().to_vec()),
    }
}

/// Write JSON output to file
pub fn write_json_output(output_path: &Path, report: &JsonReport) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON output: {}", output_path.display()))?;

    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .with_context(|| format!("Failed to write JSON output: {}", output_path.display()))?;

    Ok(())
}

/// Format duration in human-readable format
fn format_duration_human(d: Duration) -> String {
    let micros = d.as_micros() as u64;

    if micros == 0 {
        return "0µs".to_string();
    }

    if micros < 1000 {
        format!("{}µs", micros)
    } else if micros < 1_000_000 {
        format!("{:.3}ms", micros as f64 / 1000.0)
    } else if micros < 60_000_000 {
        format!("{:.3}s", micros as f64 / 1_000_000.0)
    } else {
        format!("{:.2}m", micros as f64 / 60_000_000.0)
    }
}
