// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use serde_json::json;

use crate::proof::{
    FailureReason, Policy, ProofSubmission, ProofVerifier, ThresholdVerifier, CLAIM_THRESHOLD_MET, CLAIM_UNVERIFIED,
};
use crate::types::ClientId;

fn submission(proof: serde_json::Value, signals: Vec<f64>) -> ProofSubmission {
    ProofSubmission {
        client_id: ClientId::from("agent-nexus-prover"),
        proof,
        public_signals: signals,
    }
}

fn valid_artifact() -> serde_json::Value {
    json!({ "id": "π_VALID_001", "metadata": "CORTEX_ZKP_v3", "timestamp": 123456789 })
}

#[test]
fn test_honest_proof_accepted() {
    let res = ThresholdVerifier.verify(&submission(valid_artifact(), vec![75.0]), &Policy::default());
    assert!(res.ok);
    assert_eq!(res.claim, CLAIM_THRESHOLD_MET);
}

#[test]
fn test_spoofed_scheme_rejected() {
    let fake = json!({ "id": "π_FAKE_001", "metadata": "MALICIOUS_INJECTION", "timestamp": 123456789 });
    let res = ThresholdVerifier.verify(&submission(fake, vec![75.0]), &Policy::default());
    assert!(!res.ok);
    assert_eq!(res.reason, Some(FailureReason::SchemeMismatch));
}

#[test]
fn test_malformed_artifacts_rejected() {
    let cases = vec![
        (json!({ "id": "NOT_A_PROOF" }), FailureReason::BadProofId),
        (json!({ "id": "π_", "metadata": "CORTEX_ZKP_v3", "timestamp": 1 }), FailureReason::BadProofId),
        (json!({ "id": 7, "metadata": "CORTEX_ZKP_v3", "timestamp": 1 }), FailureReason::BadProofId),
        (json!({ "id": "π_x", "metadata": "CORTEX_ZKP_v3" }), FailureReason::BadTimestamp),
        (json!({ "id": "π_x", "metadata": "CORTEX_ZKP_v3", "timestamp": -1 }), FailureReason::BadTimestamp),
        (json!("π_x"), FailureReason::NotAnObject),
        (serde_json::Value::Null, FailureReason::NotAnObject),
    ];
    for (artifact, reason) in cases {
        let res = ThresholdVerifier.verify(&submission(artifact, vec![90.0]), &Policy::default());
        assert!(!res.ok);
        assert_eq!(res.reason, Some(reason));
    }
}

#[test]
fn test_threshold_predicate() {
    let policy = Policy::with_threshold(75.0);
    assert!(ThresholdVerifier.verify(&submission(valid_artifact(), vec![75.0]), &policy).ok);
    assert!(ThresholdVerifier.verify(&submission(valid_artifact(), vec![99.5, 1.0]), &policy).ok);

    let below = ThresholdVerifier.verify(&submission(valid_artifact(), vec![74.99]), &policy);
    assert!(!below.ok);
    assert_eq!(below.reason, Some(FailureReason::BelowThreshold));
}

#[test]
fn test_empty_or_non_finite_signals_rejected() {
    let policy = Policy::default();
    let empty = ThresholdVerifier.verify(&submission(valid_artifact(), vec![]), &policy);
    assert_eq!(empty.reason, Some(FailureReason::NoSignals));

    let nan = ThresholdVerifier.verify(&submission(valid_artifact(), vec![80.0, f64::NAN]), &policy);
    assert_eq!(nan.reason, Some(FailureReason::NonFiniteSignal));
}

#[test]
fn test_rejection_leaks_nothing() {
    let res = ThresholdVerifier.verify(&submission(valid_artifact(), vec![12.34]), &Policy::default());
    assert_eq!(res.claim, CLAIM_UNVERIFIED);
    let json = serde_json::to_string(&res).unwrap();
    assert!(!json.contains("12.34"));
    assert!(!json.contains("reason"));
}

#[test]
fn test_verification_is_pure() {
    let s = submission(valid_artifact(), vec![80.0]);
    let p = Policy::default();
    let first = ThresholdVerifier.verify(&s, &p);
    for _ in 0..10 {
        assert_eq!(ThresholdVerifier.verify(&s, &p), first);
    }
}
