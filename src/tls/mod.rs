//! TLS certificate chain fetching.
//!
//! This module connects to hostnames and turns the presented chains into
//! [`CertificateRecord`]s:
//! - [`ChainSource`] is the seam to the network (real TLS or a scripted source)
//! - [`fetch_host`] bounds a fetch with the hard timeout, completes the chain
//!   with the trust anchor the server left out, and classifies every certificate
//!
//! Uses `tokio-rustls` for async TLS connections and `x509-parser` for certificate parsing.

mod connect;
mod verifier;

use std::time::Duration;

use futures::future::BoxFuture;
use log::{debug, warn};
use rustls::pki_types::CertificateDer;

use crate::classify::classify;
use crate::error_handling::{FetchError, FetchStats};
use crate::models::{CertificateRecord, TrustAnchorSet};

pub use connect::TlsChainSource;

/// Something that can hand over the certificate chain a hostname presents.
pub trait ChainSource: Send + Sync + 'static {
    /// Returns the peer chain in the order the peer sent it (leaf first).
    fn fetch_chain<'a>(
        &'a self,
        hostname: &'a str,
    ) -> BoxFuture<'a, Result<Vec<CertificateDer<'static>>, FetchError>>;

    /// Reports whether TLS can be used at all. A run does not start otherwise.
    fn tls_available(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Fetches and classifies the chain of one hostname.
///
/// Never fails: any error becomes a single synthetic error record carrying the
/// error text, and is counted in `stats`.
pub async fn fetch_host<S: ChainSource + ?Sized>(
    source: &S,
    hostname: &str,
    anchors: &TrustAnchorSet,
    hard_timeout: Duration,
    stats: &FetchStats,
) -> Vec<CertificateRecord> {
    match fetch_records(source, hostname, anchors, hard_timeout).await {
        Ok(records) => records,
        Err(e) => {
            warn!("Failed to fetch certificates for {hostname}: {e}");
            stats.increment(e.kind());
            vec![CertificateRecord::fetch_error(hostname, e.to_string())]
        }
    }
}

async fn fetch_records<S: ChainSource + ?Sized>(
    source: &S,
    hostname: &str,
    anchors: &TrustAnchorSet,
    hard_timeout: Duration,
) -> Result<Vec<CertificateRecord>, FetchError> {
    let chain = tokio::time::timeout(hard_timeout, source.fetch_chain(hostname))
        .await
        .map_err(|_| FetchError::Timeout)??;

    let chain = complete_chain(chain, anchors);

    let mut records = Vec::with_capacity(chain.len());
    for der in &chain {
        match classify(der.as_ref(), anchors) {
            Ok(mut record) => {
                record.observed_hostnames.insert(hostname.to_string());
                records.push(record);
            }
            Err(e) => debug!("Skipping certificate presented by {hostname}: {e}"),
        }
    }

    if records.is_empty() {
        return Err(FetchError::NoPeerCertificates);
    }
    Ok(records)
}

/// Appends the trust anchor that issued the last certificate, if the server
/// did not send it.
///
/// Nothing is appended when the chain already contains a certificate whose
/// subject is the last certificate's issuer, or when no anchor has that subject.
pub fn complete_chain(
    mut chain: Vec<CertificateDer<'static>>,
    anchors: &TrustAnchorSet,
) -> Vec<CertificateDer<'static>> {
    if let Some(anchor) = missing_anchor(&chain, anchors) {
        debug!("Appending trust anchor missing from the presented chain");
        chain.push(anchor);
    }
    chain
}

fn missing_anchor(
    chain: &[CertificateDer<'static>],
    anchors: &TrustAnchorSet,
) -> Option<CertificateDer<'static>> {
    let (_, last) = x509_parser::parse_x509_certificate(chain.last()?.as_ref()).ok()?;
    let issuer = last.issuer().as_raw();

    let issuer_in_chain = chain.iter().any(|der| {
        x509_parser::parse_x509_certificate(der.as_ref())
            .map(|(_, cert)| cert.subject().as_raw() == issuer)
            .unwrap_or(false)
    });
    if issuer_in_chain {
        return None;
    }
    anchors.find_by_subject(issuer).cloned()
}
