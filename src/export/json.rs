//! JSON export.

use std::io;

use serde::Serialize;

use crate::gather::ScanResults;
use crate::models::CertificateRecord;

#[derive(Serialize)]
struct JsonExport<'a> {
    unused_roots: &'a [CertificateRecord],
    results: &'a [CertificateRecord],
}

/// Writes `results` as one pretty-printed JSON object.
pub fn write_json<W: io::Write>(out: &mut W, results: &ScanResults) -> serde_json::Result<()> {
    let export = JsonExport {
        unused_roots: &results.unused_roots,
        results: &results.records,
    };
    serde_json::to_writer_pretty(&mut *out, &export)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_json_layout() {
        let results = ScanResults {
            records: vec![CertificateRecord::fetch_error("down.example", "timeout")],
            unused_roots: Vec::new(),
        };
        let mut out = Vec::new();
        write_json(&mut out, &results).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["unused_roots"].as_array().map(Vec::len), Some(0));
        let record = &value["results"][0];
        assert_eq!(record["subject"], "down.example: timeout");
        assert_eq!(record["errors"][0], "timeout");
        assert_eq!(record["occurrence_count"], 1);
        assert!(record.get("der").is_none());
    }
}
