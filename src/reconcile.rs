//! Trust anchors that no scanned chain used.

use std::collections::HashSet;

use log::debug;

use crate::classify::classify;
use crate::models::{CertificateRecord, TrustAnchorSet};

/// Returns one record per trust anchor that no chain of the run contained.
///
/// An anchor counts as used when its bytes are in `observed_der` or in one of
/// the `observed` records, or when an observed certificate record carries its
/// subject. `observed_der` must hold every certificate seen during the run;
/// the aggregated records keep a single DER per subject.
///
/// The records are flagged as system trust anchors regardless of their SANs:
/// they stand for "trusted but unused in this scan". Anchors that do not
/// parse are left out.
pub fn reconcile(
    observed: &[CertificateRecord],
    observed_der: &HashSet<Vec<u8>>,
    anchors: &TrustAnchorSet,
) -> Vec<CertificateRecord> {
    let seen: HashSet<&[u8]> = observed
        .iter()
        .map(|record| record.der.as_slice())
        .chain(observed_der.iter().map(Vec::as_slice))
        .filter(|der| !der.is_empty())
        .collect();
    let seen_subjects: HashSet<&str> = observed
        .iter()
        .filter(|record| !record.is_error())
        .map(|record| record.subject.as_str())
        .collect();

    anchors
        .iter()
        .filter(|anchor| !seen.contains(&anchor[..]))
        .filter_map(|anchor| match classify(anchor.as_ref(), anchors) {
            Ok(mut record) => {
                record.is_system_trust_anchor = true;
                Some(record)
            }
            Err(e) => {
                debug!("Skipping trust anchor: {e}");
                None
            }
        })
        .filter(|record| {
            let used = seen_subjects.contains(record.subject.as_str());
            if used {
                debug!("Trust anchor {} observed by subject", record.subject);
            }
            !used
        })
        .collect()
}
