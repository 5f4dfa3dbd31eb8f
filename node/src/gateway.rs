// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Stream Gateway
//!
//! Glue between HTTP and the kernel. Consent writes queue on one async
//! mutex around the committer; stream decisions run on the latest published
//! view and never wait for a writer.

use std::sync::Arc;

use neuro_kernel::consent::{ConsentRegistry, ConsentState};
use neuro_kernel::decision::{AccessDecisionEngine, AuditCounter, StreamRequest};
use neuro_kernel::ledger::{Blake3Hasher, BlockHasher, Clock, Ledger, LedgerBlock, SystemClock};
use neuro_kernel::proof::{Policy, ThresholdVerifier};
use neuro_kernel::signal::{SimulatedHeadset, TelemetryPacket};
use neuro_kernel::types::{AccessDecision, ClientClass, ClientId, ConsentAction};
use tokio::sync::Mutex;

use crate::api::{AuditEntry, LedgerVerifyResponse};
use crate::config::NodeConfig;
use crate::errors::GatewayError;
use crate::ledger_store::{recover_ledger, ConsentChange, LedgerCommitter, LedgerView, PublishedView};
use crate::telemetry;

pub type SharedGateway = Arc<StreamGateway>;

pub struct StreamGateway {
    committer: Mutex<LedgerCommitter>,
    view: Arc<PublishedView>,
    engine: AccessDecisionEngine,
    default_client: ClientId,
}

impl StreamGateway {
    pub fn new(committer: LedgerCommitter, engine: AccessDecisionEngine, default_client: ClientId) -> Self {
        let view = committer.view();
        Self {
            committer: Mutex::new(committer),
            view,
            engine,
            default_client,
        }
    }

    /// Wire the production components: BLAKE3, wall clock, simulated
    /// headset, threshold verifier. Replays the ledger log if one is
    /// configured.
    pub fn from_config(cfg: &NodeConfig) -> Result<Self, GatewayError> {
        let hasher: Arc<dyn BlockHasher> = Arc::new(Blake3Hasher);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let (ledger, registry) = match &cfg.ledger_path {
            Some(path) => recover_ledger(path, hasher, clock.clone())?,
            None => {
                tracing::warn!("No ledger path configured: consent history will not survive restart");
                (Ledger::new(hasher, clock.clone()), ConsentRegistry::new())
            }
        };

        let engine = AccessDecisionEngine::new(
            Arc::new(ThresholdVerifier),
            Policy::with_threshold(cfg.policy_threshold),
            Arc::new(SimulatedHeadset::new(cfg.device_id.clone())),
            clock,
            Arc::new(AuditCounter::new()),
        );

        Ok(Self::new(
            LedgerCommitter::new(ledger, registry),
            engine,
            ClientId::new(cfg.default_client.clone()),
        ))
    }

    /// Latest committed ledger state.
    pub fn snapshot(&self) -> Arc<LedgerView> {
        self.view.load()
    }

    /// Decide one poll. A halted ledger establishes no consent, so legacy
    /// requests against it are denied whatever its blocks claim.
    pub fn stream(&self, request: &StreamRequest) -> (AccessDecision, TelemetryPacket, AuditEntry) {
        let view = self.snapshot();
        let untrusted = ConsentRegistry::new();
        let registry = match view.halted {
            Some(_) => &untrusted,
            None => &view.registry,
        };
        let (decision, packet) = self.engine.decide(request, registry);

        telemetry::record_decision(request.mode, decision);

        let entry = AuditEntry {
            requester: request.client_id.to_string(),
            timestamp: packet.timestamp,
            decision,
        };
        (decision, packet, entry)
    }

    /// Append an explicit GRANT or REVOKE. Without a class the client keeps
    /// the one already on record.
    pub async fn record_consent(
        &self,
        client_id: ClientId,
        class: Option<ClientClass>,
        action: ConsentAction,
    ) -> Result<(ConsentState, LedgerBlock), GatewayError> {
        let mut committer = self.committer.lock().await;
        let class = class.unwrap_or_else(|| committer.registry().current(&client_id).client_class);
        Ok(committer.commit(ConsentChange::Record { client_id, class, action })?)
    }

    /// Flip the client's current consent.
    pub async fn toggle_consent(
        &self,
        client_id: ClientId,
        class: Option<ClientClass>,
    ) -> Result<(ConsentState, LedgerBlock), GatewayError> {
        let mut committer = self.committer.lock().await;
        Ok(committer.commit(ConsentChange::Toggle { client_id, class })?)
    }

    /// Re-verify the live chain. A failure halts the ledger.
    pub async fn verify_ledger(&self) -> LedgerVerifyResponse {
        let mut committer = self.committer.lock().await;
        let result = committer.enforce_integrity();
        let ledger = committer.ledger();

        LedgerVerifyResponse {
            intact: result.is_ok(),
            length: ledger.len() as u64,
            head_hash: ledger.head_hash(),
            violation: result.err(),
        }
    }

    pub fn denied_total(&self) -> u64 {
        self.engine.audit().denied()
    }

    pub fn audit(&self) -> &Arc<AuditCounter> {
        self.engine.audit()
    }

    pub fn default_client(&self) -> &ClientId {
        &self.default_client
    }

    pub fn is_halted(&self) -> bool {
        self.snapshot().halted.is_some()
    }
}
