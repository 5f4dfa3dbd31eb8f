// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Block Hashing
//!
//! BLAKE3 is the canonical chain hash. The [`BlockHasher`] seam exists so
//! tests can pin digests; production code always runs [`Blake3Hasher`].
//!
//! # Preimage Layout
//! ```text
//! index          u64 LE
//! timestamp      f64 bits, u64 LE
//! action         u8
//! client_class   u8
//! client_id_len  u32 LE
//! client_id      UTF-8 bytes
//! previous_hash  32 bytes
//! ```

use crate::types::{BlockHash, ClientClass, ClientId, ConsentAction};

pub trait BlockHasher: Send + Sync {
    fn digest(&self, preimage: &[u8]) -> [u8; 32];
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3Hasher;

impl BlockHasher for Blake3Hasher {
    fn digest(&self, preimage: &[u8]) -> [u8; 32] {
        *blake3::hash(preimage).as_bytes()
    }
}

/// Canonical preimage for a block's hash.
pub fn block_preimage(
    index: u64,
    timestamp: f64,
    action: ConsentAction,
    client_class: ClientClass,
    client_id: &ClientId,
    previous_hash: &BlockHash,
) -> Vec<u8> {
    let id = client_id.as_str().as_bytes();
    let mut buf = Vec::with_capacity(8 + 8 + 1 + 1 + 4 + id.len() + 32);
    buf.extend_from_slice(&index.to_le_bytes());
    buf.extend_from_slice(&timestamp.to_bits().to_le_bytes());
    buf.push(action as u8);
    buf.push(client_class as u8);
    buf.extend_from_slice(&(id.len() as u32).to_le_bytes());
    buf.extend_from_slice(id);
    buf.extend_from_slice(previous_hash.as_bytes());
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preimage_is_length_delimited() {
        // "ab" + class byte must not collide with "a" + shifted bytes
        let a = block_preimage(0, 1.0, ConsentAction::Grant, ClientClass::Legacy, &ClientId::from("ab"), &BlockHash::ZERO);
        let b = block_preimage(0, 1.0, ConsentAction::Grant, ClientClass::Legacy, &ClientId::from("a"), &BlockHash::ZERO);
        assert_ne!(a, b);
        assert_eq!(a.len(), b.len() + 1);
    }

    #[test]
    fn test_blake3_digest_deterministic() {
        let pre = block_preimage(3, 1700000000.25, ConsentAction::Revoke, ClientClass::Sovereign, &ClientId::from("c1"), &BlockHash([7; 32]));
        assert_eq!(Blake3Hasher.digest(&pre), Blake3Hasher.digest(&pre));
        assert_eq!(Blake3Hasher.digest(&pre), *blake3::hash(&pre).as_bytes());
    }
}
