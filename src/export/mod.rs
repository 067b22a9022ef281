//! Result export.
//!
//! Two formats:
//! - **Text**: one human-readable block per certificate with its PEM encoding,
//!   unused trust anchors first
//! - **JSON**: a single object with `unused_roots` and `results` arrays

mod json;
mod text;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;

use crate::config::ExportFormat;
use crate::error_handling::ExportError;
use crate::gather::ScanResults;

pub use json::write_json;
pub use text::{render_record, write_pem, write_text};

/// Writes `results` to `path` in `format`, replacing any existing file.
///
/// # Errors
///
/// Returns `ExportError` if the file cannot be created or written.
pub fn export_to_file(
    path: &Path,
    results: &ScanResults,
    format: ExportFormat,
) -> Result<(), ExportError> {
    let mut out = BufWriter::new(File::create(path)?);
    match format {
        ExportFormat::Text => write_text(&mut out, results)?,
        ExportFormat::Json => write_json(&mut out, results)?,
    }
    out.flush()?;

    info!(
        "Exported {} record(s) and {} unused root(s) to {}",
        results.records.len(),
        results.unused_roots.len(),
        path.display()
    );
    Ok(())
}
