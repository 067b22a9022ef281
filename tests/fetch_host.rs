//! Per-host fetching: chain completion, classification and error records.

mod helpers;

use std::time::Duration;

use cert_census::error_handling::{FetchError, FetchErrorKind, FetchStats};
use cert_census::tls::{complete_chain, fetch_host};
use cert_census::TrustAnchorSet;
use helpers::{Script, ScriptedSource, TestCa};
use rustls::pki_types::CertificateDer;

const HARD_TIMEOUT: Duration = Duration::from_millis(200);

#[tokio::test]
async fn test_missing_root_is_appended_from_trust_store() {
    let root = TestCa::new("Census Root");
    let anchors = TrustAnchorSet::new(vec![root.der()]);
    let source = ScriptedSource::new().with_chain("a.example", vec![root.issue_leaf("a.example")]);
    let stats = FetchStats::new();

    let records = fetch_host(&source, "a.example", &anchors, HARD_TIMEOUT, &stats).await;

    assert_eq!(records.len(), 2);
    let leaf = &records[0];
    assert_eq!(leaf.subject, "a.example ");
    assert_eq!(leaf.issuer, TestCa::subject("Census Root"));
    assert_eq!(leaf.subject_alt_names, vec!["a.example".to_string()]);
    assert!(!leaf.is_system_trust_anchor);

    let appended = &records[1];
    assert_eq!(appended.subject, TestCa::subject("Census Root"));
    assert!(appended.is_system_trust_anchor);
    assert!(appended.is_ca);
    assert!(appended.is_self_signed);

    for record in &records {
        assert!(record.observed_hostnames.contains("a.example"));
        assert_eq!(record.occurrence_count, 1);
    }
    assert_eq!(stats.total(), 0);
}

#[tokio::test]
async fn test_presented_root_is_not_appended_again() {
    let root = TestCa::new("Census Root");
    let anchors = TrustAnchorSet::new(vec![root.der()]);
    let source = ScriptedSource::new()
        .with_chain("a.example", vec![root.issue_leaf("a.example"), root.der()]);

    let records = fetch_host(&source, "a.example", &anchors, HARD_TIMEOUT, &FetchStats::new()).await;

    assert_eq!(records.len(), 2);
    assert!(records[1].is_system_trust_anchor);
}

#[tokio::test]
async fn test_unknown_root_leaves_chain_as_presented() {
    let root = TestCa::new("Private Root");
    let source = ScriptedSource::new().with_chain("a.example", vec![root.issue_leaf("a.example")]);

    let records = fetch_host(
        &source,
        "a.example",
        &TrustAnchorSet::default(),
        HARD_TIMEOUT,
        &FetchStats::new(),
    )
    .await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].subject, "a.example ");
}

#[tokio::test]
async fn test_fetch_error_becomes_single_error_record() {
    let error = FetchError::Handshake("unexpected message".to_string());
    let source = ScriptedSource::new().with_script("a.example", Script::Fail(error.clone()));
    let stats = FetchStats::new();

    let records = fetch_host(&source, "a.example", &TrustAnchorSet::default(), HARD_TIMEOUT, &stats).await;

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert!(record.is_error());
    assert_eq!(record.subject, format!("a.example: {error}"));
    assert_eq!(record.errors, vec![error.to_string()]);
    assert_eq!(record.observed_hostnames.len(), 1);
    assert!(record.der.is_empty());
    assert_eq!(stats.get(FetchErrorKind::Handshake), 1);
}

#[tokio::test]
async fn test_hung_host_hits_hard_timeout() {
    let source = ScriptedSource::new().with_script("slow.example", Script::Hang);
    let stats = FetchStats::new();

    let records = tokio::time::timeout(
        Duration::from_secs(5),
        fetch_host(
            &source,
            "slow.example",
            &TrustAnchorSet::default(),
            Duration::from_millis(50),
            &stats,
        ),
    )
    .await
    .expect("hard timeout did not fire");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].subject, "slow.example: timeout");
    assert_eq!(records[0].errors, vec!["timeout".to_string()]);
    assert_eq!(stats.get(FetchErrorKind::Timeout), 1);
}

#[tokio::test]
async fn test_unparseable_certificates_are_skipped() {
    let root = TestCa::new("Census Root");
    let garbage = CertificateDer::from(vec![0x30, 0x03, 0x02, 0x01, 0x00]);
    let source = ScriptedSource::new()
        .with_chain("a.example", vec![garbage.clone(), root.issue_leaf("a.example")])
        .with_chain("b.example", vec![garbage]);
    let stats = FetchStats::new();
    let anchors = TrustAnchorSet::default();

    let records = fetch_host(&source, "a.example", &anchors, HARD_TIMEOUT, &stats).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].subject, "a.example ");

    // Nothing usable left: reported like an empty chain
    let records = fetch_host(&source, "b.example", &anchors, HARD_TIMEOUT, &stats).await;
    assert_eq!(records.len(), 1);
    assert!(records[0].is_error());
    assert_eq!(stats.get(FetchErrorKind::NoPeerCertificates), 1);
}

#[test]
fn test_complete_chain_only_appends_matching_anchor() {
    let root = TestCa::new("Census Root");
    let other = TestCa::new("Other Root");
    let anchors = TrustAnchorSet::new(vec![other.der(), root.der()]);

    let chain = complete_chain(vec![root.issue_leaf("a.example")], &anchors);
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[1], root.der());

    let chain = complete_chain(Vec::new(), &anchors);
    assert!(chain.is_empty());
}
