//! Application configuration and constants.
//!
//! This module provides:
//! - Policy constants (batch size, timeouts, port)
//! - CLI option types and parsing
//! - Conversion into the scheduler's [`GatherConfig`](crate::gather::GatherConfig)

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, ExportFormat, LogFormat, LogLevel, RecordFilter};
