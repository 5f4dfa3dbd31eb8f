// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Shared value types for the consent kernel.

pub mod id;
pub mod enums;
pub mod digest;

pub use id::ClientId;
pub use enums::{AccessDecision, AccessMode, ClientClass, ConsentAction, PacketStatus, PrivacyRisk};
pub use digest::BlockHash;
