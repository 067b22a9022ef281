//! Run state and the messages published to observers.

use std::ops::Range;
use std::sync::Arc;

use crate::models::CertificateRecord;

/// Lifecycle of a run: `Idle -> Running -> (Finished | Cancelled)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Running,
    Finished,
    Cancelled,
}

/// Observable state of the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    pub phase: RunPhase,
    pub busy: bool,
    pub stop_requested: bool,
    /// 0 to 100.
    pub progress_percent: u8,
    pub status_text: String,
}

/// What the display side sees: scan results sorted by count, plus the trust
/// anchors no chain used (filled in once the run finishes).
#[derive(Debug, Clone, Default)]
pub struct ScanResults {
    pub records: Vec<CertificateRecord>,
    pub unused_roots: Vec<CertificateRecord>,
}

/// Totals of a finished or cancelled run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total_hosts: usize,
    pub processed_hosts: usize,
    pub batches_planned: usize,
    pub batches_run: usize,
    pub cancelled: bool,
    /// Hosts that produced a synthetic error record.
    pub failed_hosts: usize,
    /// Distinct records in the final snapshot.
    pub records: usize,
    pub unused_roots: usize,
}

/// Per-batch notifications sent from the scheduler task.
#[derive(Debug, Clone)]
pub enum GatherEvent {
    BatchStarted {
        index: usize,
        batches: usize,
        hosts: Range<usize>,
        total: usize,
    },
    BatchMerged {
        index: usize,
        processed: usize,
        total: usize,
        progress_percent: u8,
        snapshot: Arc<Vec<CertificateRecord>>,
    },
    Finished(RunSummary),
}
