//! Binary support: progress logging and end-of-run reporting.

pub mod logging;
pub mod statistics;

pub use logging::log_event;
pub use statistics::{print_fetch_statistics, print_records, print_run_summary};
