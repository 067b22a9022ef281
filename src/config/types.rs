//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_USER_AGENT, HARD_TIMEOUT, TRANSFER_TIMEOUT,
};
use crate::gather::GatherConfig;
use crate::models::CertificateRecord;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Which records end up in the printed summary and the export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RecordFilter {
    /// Every record
    All,
    /// Only certificates flagged as system trust anchors
    TrustAnchors,
    /// Only certificates that are not system trust anchors (leaves, intermediates, errors)
    NonAnchors,
}

impl RecordFilter {
    /// Returns true if `record` passes this filter.
    pub fn accepts(self, record: &CertificateRecord) -> bool {
        match self {
            RecordFilter::All => true,
            RecordFilter::TrustAnchors => record.is_system_trust_anchor,
            RecordFilter::NonAnchors => !record.is_system_trust_anchor,
        }
    }
}

/// Export file format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Text blocks followed by the PEM encoding of each certificate
    Text,
    /// A single JSON document
    Json,
}

/// Command-line configuration.
///
/// # Examples
///
/// ```no_run
/// use cert_census::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     file: PathBuf::from("hostnames.txt"),
///     batch_size: 20,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cert_census",
    about = "Counts the certificates presented by a list of hostnames"
)]
pub struct Config {
    /// File to read hostnames from (one per line, `-` for stdin)
    #[arg(value_parser)]
    pub file: PathBuf,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,

    /// Number of hostnames checked concurrently per batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Connect and handshake timeout per host, in milliseconds
    #[arg(long, default_value_t = TRANSFER_TIMEOUT.as_millis() as u64)]
    pub transfer_timeout_ms: u64,

    /// Hard timeout per host, in milliseconds
    #[arg(long, default_value_t = HARD_TIMEOUT.as_millis() as u64)]
    pub hard_timeout_ms: u64,

    /// User-Agent sent in the request written after the handshake
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Write the results to this file when the run finishes
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Export format used with `--output`
    #[arg(long, value_enum, default_value = "text")]
    pub format: ExportFormat,

    /// Restrict the summary and the export to a subset of records
    #[arg(long, value_enum, default_value = "all")]
    pub filter: RecordFilter,

    /// List the trust anchors that no scanned chain used
    #[arg(long)]
    pub show_unused_roots: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file: PathBuf::from("hostnames.txt"),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            batch_size: DEFAULT_BATCH_SIZE,
            transfer_timeout_ms: TRANSFER_TIMEOUT.as_millis() as u64,
            hard_timeout_ms: HARD_TIMEOUT.as_millis() as u64,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            output: None,
            format: ExportFormat::Text,
            filter: RecordFilter::All,
            show_unused_roots: false,
        }
    }
}

impl Config {
    /// Checks the configuration for values the scheduler cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch size must be at least 1".to_string());
        }
        if self.transfer_timeout_ms == 0 || self.hard_timeout_ms == 0 {
            return Err("timeouts must be greater than zero".to_string());
        }
        if self.transfer_timeout_ms > self.hard_timeout_ms {
            return Err(format!(
                "transfer timeout ({}ms) exceeds the hard timeout ({}ms)",
                self.transfer_timeout_ms, self.hard_timeout_ms
            ));
        }
        Ok(())
    }

    /// Connect and handshake timeout per host.
    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_millis(self.transfer_timeout_ms)
    }

    /// Scheduler settings derived from this configuration.
    pub fn gather_config(&self) -> GatherConfig {
        GatherConfig {
            batch_size: self.batch_size,
            hard_timeout: Duration::from_millis(self.hard_timeout_ms),
        }
    }
}
