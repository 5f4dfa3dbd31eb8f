// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use neuro_kernel::error::IntegrityViolation;
use neuro_kernel::ledger::LedgerBlock;
use neuro_kernel::signal::TelemetryPacket;
use neuro_kernel::types::{AccessDecision, BlockHash};
use serde::{Deserialize, Serialize};

pub const MODE_SOVEREIGN_ZKP: &str = "SOVEREIGN_ZKP";
pub const ZKP_VALID: &str = "VALID";
pub const ZKP_INVALID: &str = "INVALID";

/// One line of the per-request audit trail. Never carries a reason.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub requester: String,
    pub timestamp: f64,
    pub decision: AccessDecision,
}

/// `public_signals` stays an untyped value: a list the verifier cannot use
/// must still reach it and come back as a denial, not a body rejection.
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct SovereignStreamRequest {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub proof: serde_json::Value,
    #[serde(default)]
    pub public_signals: serde_json::Value,
}

impl SovereignStreamRequest {
    /// The declared signals, or an empty list unless every entry is a number.
    pub fn signals(&self) -> Vec<f64> {
        self.public_signals
            .as_array()
            .and_then(|items| items.iter().map(serde_json::Value::as_f64).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.proof.is_null() && self.public_signals.is_null()
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SovereignStreamResponse {
    pub mode: String,
    pub zkp_status: String,
    pub inference: TelemetryPacket,
    pub audit_log: AuditEntry,
}

#[derive(Deserialize, Debug, Default)]
pub struct LegacyStreamQuery {
    pub client_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LegacyStreamResponse {
    pub data: TelemetryPacket,
    pub audit_log: AuditEntry,
}

/// `action` and `client_class` stay strings so a bad value is a 400 from
/// the handler rather than a body rejection.
#[derive(Deserialize, Serialize, Debug)]
pub struct ConsentRequest {
    pub action: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_class: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct ToggleConsentRequest {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_class: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ConsentResponse {
    pub status: String,
    pub new_block: LedgerBlock,
}

#[derive(Serialize, Debug)]
pub struct LedgerVerifyResponse {
    pub intact: bool,
    pub length: u64,
    pub head_hash: BlockHash,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<IntegrityViolation>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AuditResponse {
    pub denied_total: u64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub system: String,
    pub ledger_halted: bool,
}
