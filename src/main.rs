//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `cert_census` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use cert_census::initialization::{init_crypto_provider, init_logger_with};
use cert_census::{run_census, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load RUST_LOG and friends from .env if present
    let _ = dotenvy::dotenv();

    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    init_crypto_provider();

    match run_census(config).await {
        Ok(report) => {
            println!(
                "Checked {} domain{} ({} failed) in {:.1}s: {} distinct certificate(s), {} unused trusted root(s)",
                report.summary.processed_hosts,
                if report.summary.processed_hosts == 1 { "" } else { "s" },
                report.summary.failed_hosts,
                report.elapsed_seconds,
                report.summary.records,
                report.summary.unused_roots
            );
            if let Some(path) = report.output {
                println!("Results saved in {}", path.display());
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("cert_census error: {:#}", e);
            process::exit(1);
        }
    }
}
