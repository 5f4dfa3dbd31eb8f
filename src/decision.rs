// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Access Decision Engine
//!
//! Read-only with respect to the ledger: a decision consults a consent
//! snapshot and, in sovereign mode, the proof verifier. The only side
//! effect is the DENIED counter, a single atomic increment taken after the
//! packet is built.
//!
//! # Modes
//! - SOVEREIGN: a verified proof is the whole authorization; consent flags
//!   are not consulted and raw readings are never sampled.
//! - LEGACY: the consent flag gates disclosure of raw readings.
//!
//! Anything that cannot be established (unknown client, missing or
//! malformed proof) is DENIED.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::consent::ConsentRegistry;
use crate::ledger::{Clock, SystemClock};
use crate::proof::{Policy, ProofSubmission, ProofVerifier, ThresholdVerifier};
use crate::signal::{SignalSource, SimulatedHeadset, TelemetryPacket};
use crate::types::{AccessDecision, AccessMode, ClientId};

/// Process-wide count of DENIED decisions.
#[derive(Debug, Default)]
pub struct AuditCounter {
    denied: AtomicU64,
}

impl AuditCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the count after this denial.
    pub fn record_denial(&self) -> u64 {
        self.denied.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn denied(&self) -> u64 {
        self.denied.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Debug)]
pub struct StreamRequest {
    pub client_id: ClientId,
    pub mode: AccessMode,
    pub proof: Option<ProofSubmission>,
}

impl StreamRequest {
    pub fn legacy(client_id: impl Into<ClientId>) -> Self {
        Self {
            client_id: client_id.into(),
            mode: AccessMode::Legacy,
            proof: None,
        }
    }

    pub fn sovereign(client_id: impl Into<ClientId>, proof: Option<ProofSubmission>) -> Self {
        Self {
            client_id: client_id.into(),
            mode: AccessMode::Sovereign,
            proof,
        }
    }
}

pub struct AccessDecisionEngine {
    verifier: Arc<dyn ProofVerifier>,
    policy: Policy,
    source: Arc<dyn SignalSource>,
    clock: Arc<dyn Clock>,
    audit: Arc<AuditCounter>,
}

impl AccessDecisionEngine {
    pub fn new(
        verifier: Arc<dyn ProofVerifier>,
        policy: Policy,
        source: Arc<dyn SignalSource>,
        clock: Arc<dyn Clock>,
        audit: Arc<AuditCounter>,
    ) -> Self {
        Self {
            verifier,
            policy,
            source,
            clock,
            audit,
        }
    }

    /// Threshold verifier, simulated headset, system clock.
    pub fn with_policy(policy: Policy) -> Self {
        Self::new(
            Arc::new(ThresholdVerifier),
            policy,
            Arc::new(SimulatedHeadset::default()),
            Arc::new(SystemClock),
            Arc::new(AuditCounter::new()),
        )
    }

    pub fn decide(&self, request: &StreamRequest, consent: &ConsentRegistry) -> (AccessDecision, TelemetryPacket) {
        let now = self.clock.now();
        let device = self.source.device_id();

        let allowed = match request.mode {
            AccessMode::Sovereign => self.decide_sovereign(request, now, device),
            AccessMode::Legacy => self.decide_legacy(request, consent, now, device),
        };

        match allowed {
            Some(packet) => (AccessDecision::Allowed, packet),
            None => {
                let packet = TelemetryPacket::encrypted(now, device, &mut rand::thread_rng());
                let total = self.audit.record_denial();
                tracing::debug!(client = %request.client_id, mode = ?request.mode, denied_total = total, "Access denied");
                (AccessDecision::Denied, packet)
            }
        }
    }

    fn decide_sovereign(&self, request: &StreamRequest, now: f64, device: &str) -> Option<TelemetryPacket> {
        let submission = match &request.proof {
            Some(s) => s,
            None => {
                tracing::debug!(client = %request.client_id, "Sovereign request without proof");
                return None;
            }
        };

        // A proof only authorizes the client that submitted it.
        if submission.client_id != request.client_id {
            tracing::debug!(client = %request.client_id, "Proof bound to another client");
            return None;
        }

        let result = self.verifier.verify(submission, &self.policy);
        if !result.ok {
            tracing::debug!(client = %request.client_id, reason = ?result.reason, "Proof rejected");
            return None;
        }

        Some(TelemetryPacket::sovereign(now, device, &result.claim))
    }

    fn decide_legacy(
        &self,
        request: &StreamRequest,
        consent: &ConsentRegistry,
        now: f64,
        device: &str,
    ) -> Option<TelemetryPacket> {
        if !consent.current(&request.client_id).granted {
            return None;
        }
        Some(TelemetryPacket::exposed(now, device, self.source.sample()))
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn audit(&self) -> &Arc<AuditCounter> {
        &self.audit
    }
}
