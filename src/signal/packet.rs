// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Telemetry packets.
//!
//! Three shapes, one struct. Every packet carries the full channel set so a
//! poller cannot tell denied from redacted from exposed by structure alone.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::signal::{infer_state, uniform_frame, ChannelValues, CHANNELS};
use crate::types::{PacketStatus, PrivacyRisk};

/// Value every channel carries once redacted for sovereign mode.
pub const REDACTED_READING: f64 = 0.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPacket {
    pub timestamp: f64,
    pub device_id: String,
    pub channel_values: ChannelValues,
    pub inferred_state: String,
    pub privacy_risk: PrivacyRisk,
    pub status: PacketStatus,
}

impl TelemetryPacket {
    /// Raw readings and the label inferred from them.
    pub fn exposed(timestamp: f64, device_id: &str, readings: ChannelValues) -> Self {
        let label = infer_state(&readings);
        Self {
            timestamp,
            device_id: device_id.to_string(),
            channel_values: readings,
            inferred_state: label.as_str().to_string(),
            privacy_risk: PrivacyRisk::Exposed,
            status: PacketStatus::Exposed,
        }
    }

    /// Fixed placeholder readings; the label is the verifier's public claim.
    pub fn sovereign(timestamp: f64, device_id: &str, claim: &str) -> Self {
        Self {
            timestamp,
            device_id: device_id.to_string(),
            channel_values: CHANNELS.iter().map(|c| (c.to_string(), REDACTED_READING)).collect(),
            inferred_state: claim.to_string(),
            privacy_risk: PrivacyRisk::ZeroKnowledgeVerified,
            status: PacketStatus::SovereignZkp,
        }
    }

    /// Synthetic noise in the reading range and an opaque token for the label.
    pub fn encrypted<R: Rng + ?Sized>(timestamp: f64, device_id: &str, rng: &mut R) -> Self {
        Self {
            timestamp,
            device_id: device_id.to_string(),
            channel_values: uniform_frame(rng),
            inferred_state: opaque_token(rng),
            privacy_risk: PrivacyRisk::None,
            status: PacketStatus::Encrypted,
        }
    }
}

/// 64 hex chars with no relation to any reading or label.
pub fn opaque_token<R: Rng + ?Sized>(rng: &mut R) -> String {
    let nonce: [u8; 32] = rng.gen();
    blake3::hash(&nonce).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_encrypted_matches_exposed_shape() {
        let mut rng = StdRng::seed_from_u64(42);
        let exposed = TelemetryPacket::exposed(1.0, "dev", uniform_frame(&mut rng));
        let encrypted = TelemetryPacket::encrypted(1.0, "dev", &mut rng);

        let keys = |p: &TelemetryPacket| p.channel_values.keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys(&exposed), keys(&encrypted));
        assert_eq!(encrypted.inferred_state.len(), 64);
        assert!(encrypted.inferred_state.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_sovereign_is_fully_redacted() {
        let p = TelemetryPacket::sovereign(1.0, "dev", "CLAIM");
        assert_eq!(p.channel_values.len(), CHANNELS.len());
        assert!(p.channel_values.values().all(|v| *v == REDACTED_READING));
        assert_eq!(p.inferred_state, "CLAIM");
    }

    #[test]
    fn test_status_wire_names() {
        let p = TelemetryPacket::sovereign(1.0, "dev", "CLAIM");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["status"], "SOVEREIGN_ZKP");
        assert_eq!(json["privacy_risk"], "ZERO_KNOWLEDGE_VERIFIED");
    }
}
