//! Plain-text export.

use std::fmt::{self, Write as _};
use std::io;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};

use crate::gather::ScanResults;
use crate::models::CertificateRecord;

const PEM_LINE_WIDTH: usize = 64;
const RULE: &str = "==========================================================";

/// Writes the unused trust anchors followed by the scan results.
pub fn write_text<W: io::Write>(out: &mut W, results: &ScanResults) -> io::Result<()> {
    writeln!(
        out,
        "Unused trusted root certificates ({}):",
        results.unused_roots.len()
    )?;
    writeln!(out)?;
    for record in &results.unused_roots {
        out.write_all(render_record(record).as_bytes())?;
    }

    writeln!(out)?;
    writeln!(out, "Scan results ({}):", results.records.len())?;
    writeln!(out)?;
    for record in &results.records {
        out.write_all(render_record(record).as_bytes())?;
    }
    Ok(())
}

/// Renders one record as a text block ending in a rule line.
pub fn render_record(record: &CertificateRecord) -> String {
    let mut block = String::new();
    // Writing into a String never fails
    let _ = write_block(&mut block, record);
    block
}

fn write_block(out: &mut String, record: &CertificateRecord) -> fmt::Result {
    writeln!(out, "Count: {}", record.occurrence_count)?;
    writeln!(out, "Subject: {}", record.subject)?;
    writeln!(out, "{}", record.subject_fields.describe())?;

    writeln!(out, "Valid From: {}", format_time(record.valid_from))?;
    writeln!(out, "Valid Until: {}", format_time(record.valid_until))?;
    writeln!(out)?;

    writeln!(out, "Issuer: {}", record.issuer)?;
    writeln!(out, "{}", record.issuer_fields.describe())?;

    writeln!(out, "CA: {}", record.is_ca)?;
    writeln!(out, "Self Signed: {}", record.is_self_signed)?;
    writeln!(out, "Trusted Root CA: {}", record.is_system_trust_anchor)?;

    if !record.observed_hostnames.is_empty() {
        let hosts: Vec<&str> = record.observed_hostnames.iter().map(String::as_str).collect();
        writeln!(out, "User Domains: {}", hosts.join(" "))?;
    }
    if !record.subject_alt_names.is_empty() {
        writeln!(out, "subjectAltNames: {}", record.subject_alt_names.join(" "))?;
    }
    if !record.errors.is_empty() {
        writeln!(out, "Errors: {}", record.errors.join(" "))?;
    }

    if !record.der.is_empty() {
        writeln!(out)?;
        write_pem(&mut *out, &record.der)?;
    }
    writeln!(out, "{RULE}")?;
    writeln!(out)
}

/// Writes `der` as a PEM certificate block.
pub fn write_pem(mut out: impl fmt::Write, der: &[u8]) -> fmt::Result {
    let body = STANDARD.encode(der);

    writeln!(out, "-----BEGIN CERTIFICATE-----")?;
    for (idx, char) in body.chars().enumerate() {
        if idx > 0 && idx % PEM_LINE_WIDTH == 0 {
            out.write_char('\n')?;
        }
        out.write_char(char)?;
    }
    writeln!(out)?;
    writeln!(out, "-----END CERTIFICATE-----")
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    match time {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "unknown".to_string(),
    }
}
