//! Data model shared by the fetcher, the aggregator and the exporters.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use rustls::pki_types::CertificateDer;
use serde::Serialize;

/// Structured form of a distinguished name.
///
/// Absent attributes are empty strings. Attributes that occur more than once
/// are joined with a single space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NameFields {
    pub country: String,
    pub state: String,
    pub locality: String,
    pub organization: String,
    pub organizational_unit: String,
    pub common_name: String,
    pub distinguished_name_qualifier: String,
    pub email: String,
    pub serial: String,
}

impl NameFields {
    /// Fields in flattening order, paired with their short labels.
    fn labelled(&self) -> [(&'static str, &str); 9] {
        [
            ("C ", self.country.as_str()),
            ("ST", self.state.as_str()),
            ("L ", self.locality.as_str()),
            ("O ", self.organization.as_str()),
            ("OU", self.organizational_unit.as_str()),
            ("CN", self.common_name.as_str()),
            ("DN", self.distinguished_name_qualifier.as_str()),
            ("E ", self.email.as_str()),
            ("SN", self.serial.as_str()),
        ]
    }

    /// Flattened display string: every present field followed by one space.
    pub fn flatten(&self) -> String {
        let mut out = String::new();
        for (_, value) in self.labelled() {
            if !value.is_empty() {
                out.push_str(value);
                out.push(' ');
            }
        }
        out
    }

    /// Multi-line rendering used by the text export.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (label, value) in self.labelled() {
            if !value.is_empty() {
                out.push_str(&format!("{label} : {value}\n"));
            }
        }
        if out.is_empty() {
            out.push_str("Empty Subject\n");
        }
        out
    }
}

/// One X.509 certificate as observed during a run, or a synthetic record
/// standing in for a hostname whose fetch failed.
///
/// Two records denote the same certificate iff their `subject` strings are equal.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CertificateRecord {
    pub subject: String,
    pub subject_fields: NameFields,
    pub issuer: String,
    pub issuer_fields: NameFields,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_ca: bool,
    pub is_self_signed: bool,
    pub is_system_trust_anchor: bool,
    pub subject_alt_names: Vec<String>,
    pub observed_hostnames: BTreeSet<String>,
    pub occurrence_count: usize,
    pub errors: Vec<String>,
    /// Raw DER encoding; empty for synthetic error records.
    #[serde(skip)]
    pub der: Vec<u8>,
}

impl CertificateRecord {
    /// Builds the placeholder record for a hostname whose fetch failed.
    pub fn fetch_error(hostname: &str, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            subject: format!("{hostname}: {error}"),
            observed_hostnames: BTreeSet::from([hostname.to_string()]),
            occurrence_count: 1,
            errors: vec![error],
            ..Default::default()
        }
    }

    /// True for synthetic error records.
    pub fn is_error(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl PartialEq for CertificateRecord {
    fn eq(&self, other: &Self) -> bool {
        self.subject == other.subject
    }
}

impl Eq for CertificateRecord {}

/// Snapshot of the system trust store, loaded once and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct TrustAnchorSet {
    anchors: Vec<CertificateDer<'static>>,
    // Raw subject name of each anchor, `None` when the anchor does not parse.
    subjects: Vec<Option<Vec<u8>>>,
    encoded: HashSet<Vec<u8>>,
}

impl TrustAnchorSet {
    /// Builds the set from DER certificates. Unparseable entries are kept for
    /// byte comparisons but never match by subject.
    pub fn new(anchors: Vec<CertificateDer<'static>>) -> Self {
        let subjects = anchors
            .iter()
            .map(|der| {
                x509_parser::parse_x509_certificate(der.as_ref())
                    .ok()
                    .map(|(_, cert)| cert.subject().as_raw().to_vec())
            })
            .collect();
        let encoded = anchors.iter().map(|der| der.to_vec()).collect();
        Self {
            anchors,
            subjects,
            encoded,
        }
    }

    /// True if `der` is byte-identical to one of the anchors.
    pub fn contains(&self, der: &[u8]) -> bool {
        self.encoded.contains(der)
    }

    /// First anchor whose raw subject name equals `raw_name`.
    pub fn find_by_subject(&self, raw_name: &[u8]) -> Option<&CertificateDer<'static>> {
        self.subjects
            .iter()
            .position(|subject| subject.as_deref() == Some(raw_name))
            .map(|idx| &self.anchors[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CertificateDer<'static>> {
        self.anchors.iter()
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}
