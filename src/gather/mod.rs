//! Batched certificate gathering.
//!
//! A [`Gatherer`] owns one run at a time. Starting a run spawns a single
//! scheduler task which:
//! 1. Splits the hostname list into fixed-size batches
//! 2. Fetches every hostname of a batch concurrently and waits for all of them
//! 3. Merges the batch into the running aggregate and publishes a snapshot
//! 4. Checks for a stop request before the next batch
//! 5. Reconciles unused trust anchors and resets the run state
//!
//! State and results are published through `tokio::sync::watch` channels;
//! per-batch events go out on the [`RunHandle`].

mod batch;
mod finalize;
mod resources;
mod state;

use std::ops::Range;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::aggregate::{sort_by_count, Aggregator};
use crate::config::{ExportFormat, DEFAULT_BATCH_SIZE, HARD_TIMEOUT};
use crate::error_handling::{ExportError, FetchStats, GatherError};
use crate::export::export_to_file;
use crate::models::TrustAnchorSet;
use crate::tls::ChainSource;

use batch::run_batch;
pub use batch::plan_batches;
use finalize::{finalize_run, LoopOutcome};
use resources::{BusyGuard, RunResources};
pub use state::{GatherEvent, RunPhase, RunState, RunSummary, ScanResults};

/// Tuning of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatherConfig {
    /// Hostnames per batch, which is also the number of concurrent fetches.
    pub batch_size: usize,
    /// Upper bound on a single host fetch.
    pub hard_timeout: Duration,
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            hard_timeout: HARD_TIMEOUT,
        }
    }
}

/// Control surface of the gathering pipeline.
pub struct Gatherer<S: ChainSource> {
    source: Arc<S>,
    anchors: Arc<TrustAnchorSet>,
    config: GatherConfig,
    stats: Arc<FetchStats>,
    busy: Arc<AtomicBool>,
    cancel: Mutex<CancellationToken>,
    state: Arc<watch::Sender<RunState>>,
    results: Arc<watch::Sender<Arc<ScanResults>>>,
}

impl<S: ChainSource> Gatherer<S> {
    pub fn new(source: Arc<S>, anchors: Arc<TrustAnchorSet>, config: GatherConfig) -> Self {
        let (state, _) = watch::channel(RunState::default());
        let (results, _) = watch::channel(Arc::new(ScanResults::default()));
        Self {
            source,
            anchors,
            config,
            stats: Arc::new(FetchStats::new()),
            busy: Arc::new(AtomicBool::new(false)),
            cancel: Mutex::new(CancellationToken::new()),
            state: Arc::new(state),
            results: Arc::new(results),
        }
    }

    /// Starts a run over `hostnames` in the background.
    ///
    /// Results of the previous run are discarded. Must be called from within a
    /// Tokio runtime.
    ///
    /// # Errors
    ///
    /// - `GatherError::AlreadyRunning` if a run is in progress; nothing changes
    /// - `GatherError::TlsUnavailable` if the chain source cannot do TLS; the
    ///   reason is put in the status text and the run never starts
    /// - `GatherError::InvalidConfig` if the batch size is zero
    pub fn start(&self, hostnames: Vec<String>) -> Result<RunHandle, GatherError> {
        // Held until the new token and state are in place, so a stop that sees
        // `busy` always reaches this run
        let mut cancel_slot = self.lock_cancel();
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(GatherError::AlreadyRunning);
        }

        if let Err(reason) = self.source.tls_available() {
            self.busy.store(false, Ordering::SeqCst);
            let status = format!("TLS is not available: {reason}");
            self.state.send_modify(|state| state.status_text = status);
            return Err(GatherError::TlsUnavailable(reason));
        }
        if self.config.batch_size == 0 {
            self.busy.store(false, Ordering::SeqCst);
            return Err(GatherError::InvalidConfig(
                "batch size must be at least 1".to_string(),
            ));
        }

        let cancel = CancellationToken::new();
        *cancel_slot = cancel.clone();

        self.stats.reset();
        self.results.send_replace(Arc::new(ScanResults::default()));
        self.state.send_replace(RunState {
            phase: RunPhase::Running,
            busy: true,
            stop_requested: false,
            progress_percent: 0,
            status_text: format!("Starting {} domains", hostnames.len()),
        });
        drop(cancel_slot);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let resources = RunResources {
            source: Arc::clone(&self.source),
            anchors: Arc::clone(&self.anchors),
            config: self.config,
            stats: Arc::clone(&self.stats),
            state: Arc::clone(&self.state),
            results: Arc::clone(&self.results),
            events: events_tx,
            cancel: cancel.clone(),
        };
        let guard = BusyGuard::new(Arc::clone(&self.busy), Arc::clone(&self.state));

        let task = tokio::spawn(async move {
            let summary = run_batches(&resources, hostnames).await;
            // Observers of `Finished` may start the next run right away
            drop(guard);
            resources.emit(GatherEvent::Finished(summary.clone()));
            summary
        });

        Ok(RunHandle {
            task,
            events: events_rx,
            cancel,
            state: Arc::clone(&self.state),
        })
    }

    /// Asks the current run to stop before its next batch.
    ///
    /// Returns `false` if nothing is running.
    pub fn request_stop(&self) -> bool {
        if !self.is_busy() {
            return false;
        }
        request_stop(&self.lock_cancel(), &self.state);
        true
    }

    /// Single start/stop entry point: stops the current run if there is one,
    /// otherwise starts a new run over `hostnames`.
    ///
    /// Returns the handle of the new run, or `None` if a stop was requested.
    pub fn toggle(&self, hostnames: Vec<String>) -> Result<Option<RunHandle>, GatherError> {
        if self.request_stop() {
            return Ok(None);
        }
        self.start(hostnames).map(Some)
    }

    /// Discards results, statistics and status. Does nothing while a run is in
    /// progress and returns `false` in that case.
    pub fn clear(&self) -> bool {
        if self.is_busy() {
            return false;
        }
        self.stats.reset();
        self.results.send_replace(Arc::new(ScanResults::default()));
        self.state.send_replace(RunState::default());
        true
    }

    /// Writes the current results to `path`.
    ///
    /// Does nothing while a run is in progress and returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` if the file cannot be written.
    pub fn export(&self, path: &Path, format: ExportFormat) -> Result<bool, ExportError> {
        if self.is_busy() {
            info!("Export skipped while a run is in progress");
            return Ok(false);
        }
        export_to_file(path, &self.results(), format)?;
        Ok(true)
    }

    /// Plain-text export, see [`Gatherer::export`].
    pub fn export_to_text(&self, path: &Path) -> Result<bool, ExportError> {
        self.export(path, ExportFormat::Text)
    }

    pub fn export_to_json(&self, path: &Path) -> Result<bool, ExportError> {
        self.export(path, ExportFormat::Json)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn run_state(&self) -> RunState {
        self.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Latest published results: the intermediate snapshot during a run, the
    /// final records with unused trust anchors after it.
    pub fn results(&self) -> Arc<ScanResults> {
        Arc::clone(&self.results.borrow())
    }

    pub fn subscribe_results(&self) -> watch::Receiver<Arc<ScanResults>> {
        self.results.subscribe()
    }

    pub fn stats(&self) -> Arc<FetchStats> {
        Arc::clone(&self.stats)
    }

    pub fn anchors(&self) -> &TrustAnchorSet {
        &self.anchors
    }

    fn lock_cancel(&self) -> MutexGuard<'_, CancellationToken> {
        self.cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn request_stop(cancel: &CancellationToken, state: &watch::Sender<RunState>) {
    cancel.cancel();
    state.send_if_modified(|state| {
        // A finished run has already reset its state
        if !state.busy || state.stop_requested {
            return false;
        }
        state.stop_requested = true;
        state.status_text = "Stopping after the current batch".to_string();
        true
    });
}

/// A run in progress.
#[derive(Debug)]
pub struct RunHandle {
    task: JoinHandle<RunSummary>,
    events: mpsc::UnboundedReceiver<GatherEvent>,
    cancel: CancellationToken,
    state: Arc<watch::Sender<RunState>>,
}

impl RunHandle {
    /// Same as [`Gatherer::request_stop`] for this run.
    pub fn request_stop(&self) {
        request_stop(&self.cancel, &self.state);
    }

    /// Next event of the run, `None` once the run has finished and every
    /// event was received.
    pub async fn next_event(&mut self) -> Option<GatherEvent> {
        self.events.recv().await
    }

    /// Waits for the run to finish.
    ///
    /// # Errors
    ///
    /// Returns `GatherError::TaskFailed` if the scheduler task panicked.
    pub async fn wait(self) -> Result<RunSummary, GatherError> {
        self.task
            .await
            .map_err(|e| GatherError::TaskFailed(e.to_string()))
    }
}

async fn run_batches<S: ChainSource>(
    resources: &RunResources<S>,
    hostnames: Vec<String>,
) -> RunSummary {
    let total = hostnames.len();
    let batch_size = resources.config.batch_size;
    let batches = plan_batches(total, batch_size);

    let planned: usize = batches.iter().map(Range::len).sum();
    if planned < total {
        warn!(
            "{} trailing domain(s) do not fill a batch of {batch_size} and will not be checked",
            total - planned
        );
    }
    info!("Checking {planned} domains in {} batch(es)", batches.len());

    let mut aggregator = Aggregator::new();
    let mut outcome = LoopOutcome {
        total_hosts: total,
        batches_planned: batches.len(),
        ..Default::default()
    };

    for (index, hosts) in batches.iter().cloned().enumerate() {
        if resources.cancel.is_cancelled() {
            info!(
                "Stop requested, skipping {} remaining batch(es)",
                batches.len() - index
            );
            outcome.cancelled = true;
            break;
        }

        resources.set_status(format!(
            "Checking domains {} to {} (of {total})",
            hosts.start, hosts.end
        ));
        resources.emit(GatherEvent::BatchStarted {
            index,
            batches: batches.len(),
            hosts: hosts.clone(),
            total,
        });

        let records = run_batch(resources, &hostnames[hosts.clone()]).await;
        outcome.failed_hosts += records.iter().filter(|r| r.is_error()).count();
        aggregator.merge(records);

        outcome.processed_hosts += hosts.len();
        outcome.batches_run += 1;
        let progress_percent = progress_percent(outcome.processed_hosts, total);
        resources
            .state
            .send_modify(|state| state.progress_percent = progress_percent);

        let mut snapshot = aggregator.snapshot();
        sort_by_count(&mut snapshot);
        let snapshot = Arc::new(snapshot);
        resources.results.send_replace(Arc::new(ScanResults {
            records: snapshot.as_ref().clone(),
            unused_roots: Vec::new(),
        }));
        resources.emit(GatherEvent::BatchMerged {
            index,
            processed: outcome.processed_hosts,
            total,
            progress_percent,
            snapshot,
        });
    }

    finalize_run(resources, &aggregator, outcome)
}

/// `100 * processed / total`, rounded down; 0 when there is nothing to do.
fn progress_percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    u8::try_from(processed.min(total) * 100 / total).unwrap_or(100)
}
