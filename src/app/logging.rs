//! Progress logging.

use log::info;

use crate::gather::GatherEvent;

/// Logs one scheduler event.
pub fn log_event(event: &GatherEvent) {
    match event {
        GatherEvent::BatchStarted {
            index,
            batches,
            hosts,
            total,
        } => info!(
            "Batch {}/{}: checking domains {} to {} (of {})",
            index + 1,
            batches,
            hosts.start,
            hosts.end,
            total
        ),
        GatherEvent::BatchMerged {
            processed,
            total,
            progress_percent,
            snapshot,
            ..
        } => info!(
            "Processed {processed} of {total} domains ({progress_percent}%), {} distinct certificate(s)",
            snapshot.len()
        ),
        GatherEvent::Finished(summary) => info!(
            "{} after {} of {} batch(es)",
            if summary.cancelled { "Stopped" } else { "Finished" },
            summary.batches_run,
            summary.batches_planned
        ),
    }
}
