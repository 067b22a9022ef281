//! Trust anchors left unused by a scan.

mod helpers;

use std::collections::HashSet;
use std::sync::Arc;

use cert_census::classify::classify;
use cert_census::reconcile::reconcile;
use cert_census::{CertificateRecord, Gatherer, TrustAnchorSet};
use helpers::{gather_config, hostnames, ScriptedSource, TestCa};
use rcgen::{BasicConstraints, CertificateParams, IsCa, KeyPair};
use rustls::pki_types::CertificateDer;

#[test]
fn test_unused_count_is_store_size_minus_observed() {
    let roots: Vec<TestCa> = (0..5).map(|i| TestCa::new(&format!("Root {i}"))).collect();
    let anchors = TrustAnchorSet::new(roots.iter().map(TestCa::der).collect());

    let observed: Vec<CertificateRecord> = roots[..2]
        .iter()
        .map(|root| classify(&root.der(), &anchors).unwrap())
        .chain(std::iter::once(CertificateRecord::fetch_error(
            "down.example",
            "timeout",
        )))
        .collect();

    let unused = reconcile(&observed, &HashSet::new(), &anchors);

    assert_eq!(unused.len(), 3);
    for record in &unused {
        assert!(record.is_system_trust_anchor);
        assert_eq!(record.occurrence_count, 1);
        assert!(record.observed_hostnames.is_empty());
        assert!(observed.iter().all(|seen| seen.subject != record.subject));
    }
}

#[test]
fn test_record_with_anchor_subject_marks_anchor_used() {
    let root = TestCa::new("Census Root");
    let anchors = TrustAnchorSet::new(vec![root.der()]);

    // Same subject string, different bytes
    let namesake = CertificateRecord {
        subject: TestCa::subject("Census Root"),
        der: root.issue_leaf("a.example").to_vec(),
        ..Default::default()
    };

    let unused = reconcile(&[namesake], &HashSet::new(), &anchors);
    assert!(unused.is_empty());
}

#[test]
fn test_error_record_subject_never_marks_anchor_used() {
    let root = TestCa::new("Census Root");
    let anchors = TrustAnchorSet::new(vec![root.der()]);
    let mut failed = CertificateRecord::fetch_error("a.example", "timeout");
    failed.subject = TestCa::subject("Census Root");

    let unused = reconcile(&[failed], &HashSet::new(), &anchors);
    assert_eq!(unused.len(), 1);
}

#[test]
fn test_observed_bytes_outside_records_mark_anchor_used() {
    let used = TestCa::new("Used Root");
    let idle = TestCa::new("Idle Root");
    let anchors = TrustAnchorSet::new(vec![used.der(), idle.der()]);
    let observed_der = HashSet::from([used.der().to_vec()]);

    let unused = reconcile(&[], &observed_der, &anchors);
    assert_eq!(unused.len(), 1);
    assert_eq!(unused[0].subject, TestCa::subject("Idle Root"));
}

#[tokio::test]
async fn test_appended_root_behind_cross_signed_namesake_is_not_unused() {
    let root = TestCa::new("Shared Root");
    // Same subject as the anchor, different key and bytes
    let cross = TestCa::new("Shared Root");
    let idle = TestCa::new("Idle Root");
    let anchors = Arc::new(TrustAnchorSet::new(vec![root.der(), idle.der()]));
    let source = Arc::new(
        ScriptedSource::new()
            .with_chain("a.example", vec![cross.issue_leaf("a.example"), cross.der()])
            .with_chain("b.example", vec![root.issue_leaf("b.example")]),
    );
    let gatherer = Gatherer::new(source, anchors, gather_config(10, 200));

    let handle = gatherer.start(hostnames(&["a.example", "b.example"])).unwrap();
    handle.wait().await.unwrap();

    let results = gatherer.results();
    let shared = results
        .records
        .iter()
        .find(|record| record.subject == TestCa::subject("Shared Root"))
        .unwrap();
    assert_eq!(shared.occurrence_count, 2);
    assert_eq!(shared.observed_hostnames.len(), 2);

    let unused: Vec<_> = results.unused_roots.iter().map(|r| r.subject.as_str()).collect();
    assert_eq!(unused, vec![TestCa::subject("Idle Root").as_str()]);
    for record in &results.unused_roots {
        assert!(results.records.iter().all(|seen| seen.subject != record.subject));
    }
}

#[test]
fn test_unused_anchor_with_sans_is_still_flagged() {
    let key = KeyPair::generate().unwrap();
    let mut params = CertificateParams::new(vec!["anchor.example".to_string()]).unwrap();
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    let der: CertificateDer<'static> = params.self_signed(&key).unwrap().der().clone();
    let anchors = TrustAnchorSet::new(vec![der]);

    let unused = reconcile(&[], &HashSet::new(), &anchors);

    assert_eq!(unused.len(), 1);
    assert!(unused[0].is_system_trust_anchor);
    assert_eq!(unused[0].subject_alt_names, vec!["anchor.example".to_string()]);
}

#[test]
fn test_unparseable_anchor_is_left_out() {
    let root = TestCa::new("Census Root");
    let anchors = TrustAnchorSet::new(vec![root.der(), CertificateDer::from(vec![0x01, 0x02])]);

    let unused = reconcile(&[], &HashSet::new(), &anchors);
    assert_eq!(unused.len(), 1);
    assert_eq!(unused[0].subject, TestCa::subject("Census Root"));
}
