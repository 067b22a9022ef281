//! System trust store loading.

use rustls_native_certs::CertificateResult;

use crate::error_handling::InitializationError;
use crate::models::TrustAnchorSet;

/// Loads the platform's trusted root certificates once.
///
/// Individual unreadable entries are logged and skipped. The load only fails
/// when the platform reported errors and produced no certificate at all.
pub fn load_trust_anchors() -> Result<TrustAnchorSet, InitializationError> {
    trust_anchors_from_result(rustls_native_certs::load_native_certs())
}

/// Turns a native certificate load result into a [`TrustAnchorSet`].
pub fn trust_anchors_from_result(
    result: CertificateResult,
) -> Result<TrustAnchorSet, InitializationError> {
    let CertificateResult { certs, errors, .. } = result;

    for err in &errors {
        log::warn!("Error loading system certificate: {err}");
    }

    if certs.is_empty() {
        if let Some(err) = errors.first() {
            return Err(InitializationError::TrustStoreError(err.to_string()));
        }
        log::warn!("System trust store is empty; no certificate will be flagged as trusted root");
    }

    let anchors = TrustAnchorSet::new(certs);
    log::debug!("Loaded {} system trust anchors", anchors.len());
    Ok(anchors)
}
