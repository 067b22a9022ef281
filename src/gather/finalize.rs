//! End-of-run reconciliation and state reset.

use std::sync::Arc;

use log::info;

use crate::aggregate::{sort_by_count, Aggregator};
use crate::reconcile::reconcile;

use super::resources::RunResources;
use super::state::{RunPhase, RunSummary, ScanResults};

/// Progress counters collected by the batch loop.
#[derive(Debug, Default)]
pub(crate) struct LoopOutcome {
    pub total_hosts: usize,
    pub processed_hosts: usize,
    pub batches_planned: usize,
    pub batches_run: usize,
    pub failed_hosts: usize,
    pub cancelled: bool,
}

/// Publishes the final results and resets the run state.
///
/// Unused trust anchors are computed against the final snapshot and every
/// certificate the run observed. Progress ends
/// at 100 and the stop request is cleared whether or not the run was cancelled.
pub(crate) fn finalize_run<S>(
    resources: &RunResources<S>,
    aggregator: &Aggregator,
    outcome: LoopOutcome,
) -> RunSummary {
    let mut records = aggregator.snapshot();
    sort_by_count(&mut records);
    let unused_roots = reconcile(&records, aggregator.observed_der(), &resources.anchors);

    let summary = RunSummary {
        total_hosts: outcome.total_hosts,
        processed_hosts: outcome.processed_hosts,
        batches_planned: outcome.batches_planned,
        batches_run: outcome.batches_run,
        cancelled: outcome.cancelled,
        failed_hosts: outcome.failed_hosts,
        records: records.len(),
        unused_roots: unused_roots.len(),
    };

    resources.results.send_replace(Arc::new(ScanResults {
        records,
        unused_roots,
    }));

    let status = if outcome.cancelled {
        format!(
            "Stopped after {} of {} domains",
            outcome.processed_hosts, outcome.total_hosts
        )
    } else {
        "Finished all domains".to_string()
    };
    resources.state.send_modify(|state| {
        state.phase = if outcome.cancelled {
            RunPhase::Cancelled
        } else {
            RunPhase::Finished
        };
        state.progress_percent = 100;
        state.stop_requested = false;
        state.status_text = status;
    });

    info!(
        "Run complete: {} of {} hosts in {} batch(es), {} record(s), {} unused root(s)",
        summary.processed_hosts,
        summary.total_hosts,
        summary.batches_run,
        summary.records,
        summary.unused_roots
    );
    summary
}
