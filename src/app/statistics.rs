//! End-of-run statistics and record summary.

use std::time::Duration;

use log::info;

use crate::config::RecordFilter;
use crate::error_handling::FetchStats;
use crate::gather::RunSummary;
use crate::models::CertificateRecord;

/// Prints the one-line summary of a run.
pub fn print_run_summary(summary: &RunSummary, elapsed: Duration) {
    info!(
        "✅ Checked {} domain{} ({} failed) in {:.1}s: {} distinct certificate(s), {} unused trusted root(s)",
        summary.processed_hosts,
        if summary.processed_hosts == 1 { "" } else { "s" },
        summary.failed_hosts,
        elapsed.as_secs_f64(),
        summary.records,
        summary.unused_roots
    );
    if summary.processed_hosts < summary.total_hosts {
        info!(
            "{} of {} domain(s) were not checked",
            summary.total_hosts - summary.processed_hosts,
            summary.total_hosts
        );
    }
}

/// Prints per-kind fetch failure counts, if there were any.
pub fn print_fetch_statistics(stats: &FetchStats) {
    let total = stats.total();
    if total == 0 {
        return;
    }
    info!("Fetch Error Counts ({total} total):");
    for (kind, count) in stats.non_zero() {
        info!("   {}: {}", kind.as_str(), count);
    }
}

/// Prints one line per record accepted by `filter`, in the given order.
///
/// Returns the number of records printed.
pub fn print_records(heading: &str, records: &[CertificateRecord], filter: RecordFilter) -> usize {
    let selected: Vec<&CertificateRecord> =
        records.iter().filter(|record| filter.accepts(record)).collect();

    info!("{heading} ({}):", selected.len());
    for record in &selected {
        info!("{}", summary_line(record));
    }
    selected.len()
}

fn summary_line(record: &CertificateRecord) -> String {
    let mut flags = Vec::new();
    if record.is_system_trust_anchor {
        flags.push("trusted root");
    }
    if record.is_ca {
        flags.push("CA");
    }
    if record.is_self_signed {
        flags.push("self-signed");
    }
    if record.is_error() {
        flags.push("error");
    }

    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };
    format!(
        "{:>6}  {}{}",
        record.occurrence_count,
        record.subject.trim_end(),
        flags
    )
}
