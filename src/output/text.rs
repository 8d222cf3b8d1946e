//! Human-readable text output

use crate::cluster::RunReport;
use crate::config::Config;
use crate::partition::partition_all;

/// Print the effective configuration and the planned sub-ranges
pub fn print_configuration(config: &Config) {
    println!("═══════════════════════════════════════════════════════════");
    println!("                    RANGESWEEP");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!("{}", config);
    println!();
}

/// Print each rank's sub-range without running (dry run)
pub fn print_plan(config: &Config) {
    println!("Planned sub-ranges:");
    match partition_all(config.search.domain_size, config.cluster.participants) {
        Ok(ranges) => {
            for (rank, range) in ranges.iter().enumerate() {
                let marker = if rank == config.cluster.coordinator_rank { " (coordinator)" } else { "" };
                println!(
                    "  Node {:>4}: {} - {} elements{}",
                    rank,
                    range,
                    format_number(range.len()),
                    marker
                );
            }
        }
        Err(e) => println!("  {}", e),
    }
    println!();
}

/// Print run results to console
///
/// Displays:
/// - Per-participant counts with range and offset (unless disabled)
/// - Total matches
/// - The largest results, largest first
/// - The complete sequence (if requested)
pub fn print_report(report: &RunReport, config: &Config) {
    println!("═══════════════════════════════════════════════════════════");
    println!("                    SEARCH RESULTS");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    println!("Elapsed Time: {:.3}s", report.elapsed.as_secs_f64());
    println!(
        "Searched [0, {}) for {} with {} participant(s)",
        format_number(report.domain_size),
        report.predicate,
        report.participants.len()
    );
    println!();

    if config.output.show_counts {
        println!("Participants:");
        for p in &report.participants {
            println!(
                "  Node {:>4} found {:>12} in {:<28} offset {:>12}  ({:.3}s)",
                p.rank,
                format_number(p.count),
                p.range.to_string(),
                format_number(p.offset as u64),
                p.compute_time.as_secs_f64()
            );
        }
        println!();
    }

    println!("Total found: {}", format_number(report.total() as u64));

    let largest = report.largest_descending(config.output.display_count);
    println!("Largest {} numbers: {}", largest.len(), format_list(&largest));

    if config.output.print_all {
        println!();
        println!("All numbers:");
        println!("{}", format_list(report.result.values()));
    }

    println!();
    println!("═══════════════════════════════════════════════════════════");
}

fn format_list(values: &[u64]) -> String {
    let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", items.join(", "))
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();

    for (count, c) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(u64::MAX), "18,446,744,073,709,551,615");
    }

    #[test]
    fn test_format_list() {
        assert_eq!(format_list(&[]), "[]");
        assert_eq!(format_list(&[29, 23, 19]), "[29, 23, 19]");
    }
}
