//! cert_census library: TLS certificate chain census
//!
//! This library connects to a list of hostnames, collects the certificate chain
//! each one presents, and counts how often every certificate (leaf,
//! intermediate or root) shows up across the whole list. Certificates are
//! classified against the system trust store, and the trust anchors that no
//! chain used are reported separately.
//!
//! # Example
//!
//! ```no_run
//! use cert_census::{run_census, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     file: std::path::PathBuf::from("hostnames.txt"),
//!     batch_size: 20,
//!     ..Default::default()
//! };
//!
//! let report = run_census(config).await?;
//! println!(
//!     "Checked {} hosts: {} distinct certificates",
//!     report.summary.processed_hosts, report.summary.records
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod aggregate;
pub mod app;
pub mod classify;
pub mod config;
pub mod error_handling;
pub mod export;
pub mod gather;
pub mod hostnames;
pub mod initialization;
pub mod models;
pub mod reconcile;
pub mod tls;

// Re-export public API
pub use config::{Config, ExportFormat, LogFormat, LogLevel, RecordFilter};
pub use gather::{GatherConfig, GatherEvent, Gatherer, RunHandle, RunState, RunSummary, ScanResults};
pub use models::{CertificateRecord, NameFields, TrustAnchorSet};
pub use run::{run_census, CensusReport};
pub use tls::{ChainSource, TlsChainSource};

// Internal run module (drives one CLI run end to end)
mod run {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Instant;

    use anyhow::{anyhow, Context, Result};
    use log::{info, warn};

    use crate::app::{log_event, print_fetch_statistics, print_records, print_run_summary};
    use crate::config::{Config, RecordFilter};
    use crate::export::export_to_file;
    use crate::gather::{Gatherer, RunSummary, ScanResults};
    use crate::hostnames::load_hostnames;
    use crate::initialization::load_trust_anchors;
    use crate::tls::TlsChainSource;

    /// Outcome of [`run_census`].
    #[derive(Debug, Clone)]
    pub struct CensusReport {
        pub summary: RunSummary,
        pub results: Arc<ScanResults>,
        pub elapsed_seconds: f64,
        /// Export file written, if `--output` was given.
        pub output: Option<PathBuf>,
    }

    /// Runs one census over the hostnames of `config.file`.
    ///
    /// Ctrl-C requests a stop; the batch in flight still completes and the
    /// partial results are reported and exported.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the trust store or the
    /// hostname file cannot be read, TLS is unavailable, or the export fails.
    pub async fn run_census(config: Config) -> Result<CensusReport> {
        config
            .validate()
            .map_err(|e| anyhow!("Invalid configuration: {e}"))?;

        let anchors =
            Arc::new(load_trust_anchors().context("Failed to load the system trust store")?);
        info!("Loaded {} trust anchor(s)", anchors.len());

        let source = Arc::new(
            TlsChainSource::new(config.transfer_timeout(), config.user_agent.clone())
                .context("Failed to initialize TLS")?,
        );
        let hostnames = load_hostnames(&config.file).await?;

        let gatherer = Gatherer::new(source, anchors, config.gather_config());
        let start_time = Instant::now();
        let mut handle = gatherer
            .start(hostnames.into_hostnames())
            .context("Failed to start the run")?;

        let mut listen_for_interrupt = true;
        loop {
            tokio::select! {
                event = handle.next_event() => match event {
                    Some(event) => log_event(&event),
                    None => break,
                },
                signal = tokio::signal::ctrl_c(), if listen_for_interrupt => {
                    match signal {
                        Ok(()) => {
                            warn!("Interrupted, stopping after the current batch");
                            handle.request_stop();
                        }
                        Err(e) => {
                            warn!("Failed to listen for Ctrl-C: {e}");
                            listen_for_interrupt = false;
                        }
                    }
                }
            }
        }
        let summary = handle.wait().await?;
        let elapsed = start_time.elapsed();

        let results = gatherer.results();
        print_fetch_statistics(&gatherer.stats());
        print_records("Certificates", &results.records, config.filter);
        if config.show_unused_roots {
            print_records("Unused trusted roots", &results.unused_roots, RecordFilter::All);
        }
        print_run_summary(&summary, elapsed);

        let output = match &config.output {
            Some(path) => {
                let filtered = filter_results(&results, config.filter);
                export_to_file(path, &filtered, config.format)
                    .with_context(|| format!("Failed to export results to {}", path.display()))?;
                Some(path.clone())
            }
            None => None,
        };

        Ok(CensusReport {
            summary,
            results,
            elapsed_seconds: elapsed.as_secs_f64(),
            output,
        })
    }

    fn filter_results(results: &ScanResults, filter: RecordFilter) -> ScanResults {
        ScanResults {
            records: results
                .records
                .iter()
                .filter(|record| filter.accepts(record))
                .cloned()
                .collect(),
            unused_roots: results.unused_roots.clone(),
        }
    }
}
