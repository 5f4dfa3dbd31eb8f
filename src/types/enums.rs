// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Consent and access enums.
//!
//! Discriminants of the `#[repr(u8)]` enums are part of the block hash
//! preimage and must never be renumbered.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum ConsentAction {
    Grant = 1,
    Revoke = 2,
}

impl ConsentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentAction::Grant => "GRANT",
            ConsentAction::Revoke => "REVOKE",
        }
    }

    /// Parses the wire form. Anything but the exact upper-case names is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GRANT" => Some(ConsentAction::Grant),
            "REVOKE" => Some(ConsentAction::Revoke),
            _ => None,
        }
    }

    /// The action that leaves a client in the given `granted` state.
    pub fn from_granted(granted: bool) -> Self {
        if granted {
            ConsentAction::Grant
        } else {
            ConsentAction::Revoke
        }
    }

    pub fn grants(&self) -> bool {
        matches!(self, ConsentAction::Grant)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum ClientClass {
    Sovereign = 1,
    Legacy = 2,
}

impl ClientClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientClass::Sovereign => "SOVEREIGN",
            ClientClass::Legacy => "LEGACY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SOVEREIGN" => Some(ClientClass::Sovereign),
            "LEGACY" => Some(ClientClass::Legacy),
            _ => None,
        }
    }
}

impl Default for ClientClass {
    fn default() -> Self {
        ClientClass::Legacy
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessMode {
    Sovereign,
    Legacy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessDecision {
    Allowed,
    Denied,
}

impl AccessDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessDecision::Allowed => "ALLOWED",
            AccessDecision::Denied => "DENIED",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrivacyRisk {
    None,
    ZeroKnowledgeVerified,
    Exposed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PacketStatus {
    Exposed,
    Encrypted,
    SovereignZkp,
}
