// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Proof Verification
//!
//! The proof artifact is opaque to the rest of the kernel. Only its
//! verification contract lives here: a pure predicate over
//! `(proof, public_signals, policy)`. A real cryptographic backend plugs in
//! behind [`ProofVerifier`] without touching the decision engine.
//!
//! # Guarantees
//! - Same input → same result
//! - Malformed input → `ok = false`, never a panic or error
//! - The result never echoes signal values or artifact fields

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::ClientId;

/// Scheme tag a well-formed artifact declares in its `metadata` field.
pub const SCHEME_TAG: &str = "CORTEX_ZKP_v3";
pub const PROOF_ID_PREFIX: &str = "π_";
pub const DEFAULT_THRESHOLD: f64 = 75.0;

pub const CLAIM_THRESHOLD_MET: &str = "STRESS_THRESHOLD_MET";
pub const CLAIM_UNVERIFIED: &str = "UNVERIFIED";

/// `client_id` binds the artifact to its submitter. The decision engine
/// denies a submission whose `client_id` differs from the requester's.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofSubmission {
    pub client_id: ClientId,
    pub proof: Value,
    pub public_signals: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Policy {
    pub threshold: f64,
    pub scheme: String,
}

impl Policy {
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            scheme: SCHEME_TAG.to_string(),
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::with_threshold(DEFAULT_THRESHOLD)
    }
}

/// Why a proof was rejected. For operator logs only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureReason {
    NotAnObject,
    BadProofId,
    SchemeMismatch,
    BadTimestamp,
    NoSignals,
    NonFiniteSignal,
    BelowThreshold,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VerificationResult {
    pub ok: bool,
    pub claim: String,
    #[serde(skip)]
    pub reason: Option<FailureReason>,
}

impl VerificationResult {
    pub fn verified(claim: impl Into<String>) -> Self {
        Self {
            ok: true,
            claim: claim.into(),
            reason: None,
        }
    }

    pub fn rejected(reason: FailureReason) -> Self {
        Self {
            ok: false,
            claim: CLAIM_UNVERIFIED.to_string(),
            reason: Some(reason),
        }
    }
}

pub trait ProofVerifier: Send + Sync {
    fn verify(&self, submission: &ProofSubmission, policy: &Policy) -> VerificationResult;
}

/// Checks artifact well-formedness and `public_signals[0] >= threshold`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThresholdVerifier;

impl ThresholdVerifier {
    fn check(&self, submission: &ProofSubmission, policy: &Policy) -> Result<(), FailureReason> {
        let artifact = submission.proof.as_object().ok_or(FailureReason::NotAnObject)?;

        let id = artifact.get("id").and_then(Value::as_str).ok_or(FailureReason::BadProofId)?;
        match id.strip_prefix(PROOF_ID_PREFIX) {
            Some(rest) if !rest.is_empty() => {}
            _ => return Err(FailureReason::BadProofId),
        }

        let scheme = artifact.get("metadata").and_then(Value::as_str);
        if scheme != Some(policy.scheme.as_str()) {
            return Err(FailureReason::SchemeMismatch);
        }

        match artifact.get("timestamp").and_then(Value::as_f64) {
            Some(ts) if ts.is_finite() && ts >= 0.0 => {}
            _ => return Err(FailureReason::BadTimestamp),
        }

        let signals = &submission.public_signals;
        let first = *signals.first().ok_or(FailureReason::NoSignals)?;
        if signals.iter().any(|s| !s.is_finite()) {
            return Err(FailureReason::NonFiniteSignal);
        }

        if first < policy.threshold {
            return Err(FailureReason::BelowThreshold);
        }

        Ok(())
    }
}

impl ProofVerifier for ThresholdVerifier {
    fn verify(&self, submission: &ProofSubmission, policy: &Policy) -> VerificationResult {
        match self.check(submission, policy) {
            Ok(()) => VerificationResult::verified(CLAIM_THRESHOLD_MET),
            Err(reason) => VerificationResult::rejected(reason),
        }
    }
}
