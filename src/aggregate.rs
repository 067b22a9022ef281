//! Cross-host aggregation of certificate records.
//!
//! Records are keyed by their flattened subject string. Merging the same
//! subject again unions the observed hostnames and bumps the count by one per
//! incoming record. The raw bytes of every certificate merged are kept apart
//! from the records, since a record holds only the first DER seen for its
//! subject.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::models::CertificateRecord;

/// Running state of a gathering run.
///
/// Only the scheduler task mutates it, one `merge` call per batch.
#[derive(Debug, Default)]
pub struct Aggregator {
    records: HashMap<String, CertificateRecord>,
    observed_der: HashSet<Vec<u8>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one batch of records.
    ///
    /// The count goes up by exactly one per incoming record, no matter how many
    /// hostnames that record lists.
    pub fn merge(&mut self, batch: Vec<CertificateRecord>) {
        for incoming in batch {
            if !incoming.der.is_empty() && !self.observed_der.contains(&incoming.der) {
                self.observed_der.insert(incoming.der.clone());
            }
            match self.records.get_mut(&incoming.subject) {
                Some(existing) => {
                    existing
                        .observed_hostnames
                        .extend(incoming.observed_hostnames);
                    existing.occurrence_count += 1;
                }
                None => {
                    let mut record = incoming;
                    record.occurrence_count = 1;
                    self.records.insert(record.subject.clone(), record);
                }
            }
        }
    }

    /// Current records in unspecified order.
    pub fn snapshot(&self) -> Vec<CertificateRecord> {
        self.records.values().cloned().collect()
    }

    /// DER of every certificate merged so far, across all chains.
    pub fn observed_der(&self) -> &HashSet<Vec<u8>> {
        &self.observed_der
    }

    pub fn reset(&mut self) {
        self.records.clear();
        self.observed_der.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Orders records by occurrence count, highest first; equal counts by subject.
pub fn sort_by_count(records: &mut [CertificateRecord]) {
    records.sort_by(|a, b| match b.occurrence_count.cmp(&a.occurrence_count) {
        Ordering::Equal => a.subject.cmp(&b.subject),
        other => other,
    });
}
