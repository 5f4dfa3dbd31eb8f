// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Ledger block.

use serde::{Deserialize, Serialize};

use crate::ledger::hash::{block_preimage, BlockHasher};
use crate::types::{BlockHash, ClientClass, ClientId, ConsentAction};

/// One consent change. Immutable once appended; consumers only ever see clones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerBlock {
    pub index: u64,
    /// Unix seconds at append time.
    pub timestamp: f64,
    pub action: ConsentAction,
    pub client_id: ClientId,
    pub client_class: ClientClass,
    pub hash: BlockHash,
    pub previous_hash: BlockHash,
}

impl LedgerBlock {
    /// Builds a sealed block: `hash` is computed from the other fields.
    pub fn seal(
        hasher: &dyn BlockHasher,
        index: u64,
        timestamp: f64,
        action: ConsentAction,
        client_id: ClientId,
        client_class: ClientClass,
        previous_hash: BlockHash,
    ) -> Self {
        let pre = block_preimage(index, timestamp, action, client_class, &client_id, &previous_hash);
        Self {
            index,
            timestamp,
            action,
            client_id,
            client_class,
            hash: BlockHash(hasher.digest(&pre)),
            previous_hash,
        }
    }

    /// Recomputes the digest from the block's fields.
    pub fn compute_hash(&self, hasher: &dyn BlockHasher) -> BlockHash {
        let pre = block_preimage(
            self.index,
            self.timestamp,
            self.action,
            self.client_class,
            &self.client_id,
            &self.previous_hash,
        );
        BlockHash(hasher.digest(&pre))
    }

    pub fn is_sealed_by(&self, hasher: &dyn BlockHasher) -> bool {
        self.compute_hash(hasher) == self.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Blake3Hasher;

    fn sample() -> LedgerBlock {
        LedgerBlock::seal(
            &Blake3Hasher,
            0,
            1_700_000_000.25,
            ConsentAction::Grant,
            ClientId::from("c1"),
            ClientClass::Sovereign,
            BlockHash::ZERO,
        )
    }

    #[test]
    fn test_bincode_keeps_seal() {
        let block = sample();
        let bytes = bincode::serde::encode_to_vec(&block, bincode::config::standard()).unwrap();
        let (decoded, read): (LedgerBlock, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard()).unwrap();

        assert_eq!(read, bytes.len());
        assert_eq!(decoded, block);
        assert!(decoded.is_sealed_by(&Blake3Hasher));
    }

    #[test]
    fn test_json_wire_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["action"], "GRANT");
        assert_eq!(json["client_class"], "SOVEREIGN");
        assert_eq!(json["previous_hash"], "0".repeat(64));
        assert_eq!(json["hash"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn test_any_field_change_breaks_seal() {
        let base = sample();

        let mut b = base.clone();
        b.timestamp += 1.0;
        assert!(!b.is_sealed_by(&Blake3Hasher));

        let mut b = base.clone();
        b.client_id = ClientId::from("c2");
        assert!(!b.is_sealed_by(&Blake3Hasher));

        let mut b = base;
        b.client_class = ClientClass::Legacy;
        assert!(!b.is_sealed_by(&Blake3Hasher));
    }
}
