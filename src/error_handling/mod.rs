//! Error handling and fetch statistics.
//!
//! This module provides:
//! - Error type definitions for initialization, fetching, scheduling and export
//! - Fetch failure categorization and thread-safe counters
//!
//! Per-host fetch errors never abort a run: they become synthetic records
//! and are tallied in [`FetchStats`].

mod stats;
mod types;

// Re-export public API
pub use stats::FetchStats;
pub use types::{
    ClassifyError, ExportError, FetchError, FetchErrorKind, GatherError, InitializationError,
};
