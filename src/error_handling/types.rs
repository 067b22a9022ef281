//! Error type definitions.
//!
//! This module defines the error types used throughout the crate and the
//! categories per-host fetch failures are counted under.

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// No usable TLS client configuration could be built.
    #[error("TLS is not supported in this environment: {0}")]
    TlsUnavailableError(String),

    /// The system trust store could not be read at all.
    #[error("Trust store error: {0}")]
    TrustStoreError(String),
}

/// Failure to obtain a certificate chain from one hostname.
///
/// The `Display` text is what ends up in the `errors` list of the synthetic
/// error record, so it stays short.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid hostname: {0}")]
    InvalidHostname(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("timeout")]
    Timeout,

    #[error("TLS handshake failed: {0}")]
    Handshake(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("server presented no certificates")]
    NoPeerCertificates,

    /// The fetch task itself died (panic or runtime shutdown).
    #[error("fetch task failed: {0}")]
    TaskFailed(String),
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::InvalidHostname(_) => FetchErrorKind::InvalidHostname,
            FetchError::Connect(_) => FetchErrorKind::Connect,
            FetchError::Timeout => FetchErrorKind::Timeout,
            FetchError::Handshake(_) => FetchErrorKind::Handshake,
            FetchError::Io(_) => FetchErrorKind::Io,
            FetchError::NoPeerCertificates => FetchErrorKind::NoPeerCertificates,
            FetchError::TaskFailed(_) => FetchErrorKind::TaskFailed,
        }
    }
}

/// Categories of per-host fetch failures, used for statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum FetchErrorKind {
    InvalidHostname,
    Connect,
    Timeout,
    Handshake,
    Io,
    NoPeerCertificates,
    TaskFailed,
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchErrorKind::InvalidHostname => "Invalid hostname",
            FetchErrorKind::Connect => "Connection error",
            FetchErrorKind::Timeout => "Timeout",
            FetchErrorKind::Handshake => "TLS handshake error",
            FetchErrorKind::Io => "I/O error",
            FetchErrorKind::NoPeerCertificates => "No peer certificates",
            FetchErrorKind::TaskFailed => "Fetch task failure",
        }
    }
}

/// A DER blob that x509-parser could not decode.
#[derive(Error, Debug)]
#[error("unparseable certificate: {0}")]
pub struct ClassifyError(pub String);

/// Errors returned by the scheduler's control surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatherError {
    /// `start` was called while a run is in progress.
    #[error("a run is already in progress")]
    AlreadyRunning,

    /// The chain source reported that it cannot do TLS at all.
    #[error("TLS is not supported in this environment: {0}")]
    TlsUnavailable(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("scheduler task failed: {0}")]
    TaskFailed(String),
}

/// Errors writing an export file.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write export file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize results: {0}")]
    Json(#[from] serde_json::Error),
}
