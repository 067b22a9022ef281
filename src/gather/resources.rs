//! Resources shared by the scheduler task and its fetch tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::error_handling::FetchStats;
use crate::models::TrustAnchorSet;

use super::state::{GatherEvent, RunPhase, RunState, ScanResults};
use super::GatherConfig;

/// Everything one run needs, cloned out of the [`Gatherer`](super::Gatherer)
/// when the run starts.
pub(crate) struct RunResources<S> {
    pub source: Arc<S>,
    pub anchors: Arc<TrustAnchorSet>,
    pub config: GatherConfig,
    pub stats: Arc<FetchStats>,
    pub state: Arc<watch::Sender<RunState>>,
    pub results: Arc<watch::Sender<Arc<ScanResults>>>,
    pub events: mpsc::UnboundedSender<GatherEvent>,
    pub cancel: CancellationToken,
}

impl<S> RunResources<S> {
    pub fn set_status(&self, status: String) {
        self.state.send_modify(|state| state.status_text = status);
    }

    /// Sends an event. Observers that went away are not an error.
    pub fn emit(&self, event: GatherEvent) {
        let _ = self.events.send(event);
    }
}

/// Clears the busy flag when the run ends, including when the scheduler task
/// panics or is aborted.
pub(crate) struct BusyGuard {
    busy: Arc<AtomicBool>,
    state: Arc<watch::Sender<RunState>>,
}

impl BusyGuard {
    pub fn new(busy: Arc<AtomicBool>, state: Arc<watch::Sender<RunState>>) -> Self {
        Self { busy, state }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.state.send_if_modified(|state| {
            let changed = state.busy || state.stop_requested;
            if state.phase == RunPhase::Running {
                state.phase = RunPhase::Cancelled;
            }
            state.busy = false;
            state.stop_requested = false;
            changed
        });
        self.busy.store(false, Ordering::SeqCst);
    }
}
