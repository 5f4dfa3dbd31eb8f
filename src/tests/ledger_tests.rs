// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::sync::{Arc, Mutex};

use crate::error::{IntegrityViolation, KernelError};
use crate::ledger::{verify_chain, Blake3Hasher, BlockSink, FixedClock, Ledger, LedgerBlock};
use crate::tests::fixtures::{test_ledger, LaneSumHasher};
use crate::types::{BlockHash, ClientClass, ClientId, ConsentAction};

fn grant(ledger: &mut Ledger, client: &str) -> LedgerBlock {
    ledger
        .append(ConsentAction::Grant, ClientId::from(client), ClientClass::Legacy)
        .unwrap()
}

#[test]
fn test_genesis_links_to_zero() {
    let mut ledger = test_ledger();
    let b0 = grant(&mut ledger, "c1");

    assert_eq!(b0.index, 0);
    assert_eq!(b0.previous_hash, BlockHash::ZERO);
    assert_eq!(b0.timestamp, 1_700_000_000.0);
    assert!(b0.is_sealed_by(&Blake3Hasher));
}

#[test]
fn test_n_appends_verify_and_index_contiguously() {
    let mut ledger = test_ledger();
    for i in 0..50 {
        let action = if i % 3 == 0 { ConsentAction::Revoke } else { ConsentAction::Grant };
        ledger.append(action, ClientId::new(format!("c{}", i % 4)), ClientClass::Legacy).unwrap();
    }

    assert!(ledger.is_intact());
    let indices: Vec<u64> = ledger.list().iter().map(|b| b.index).collect();
    assert_eq!(indices, (0..50).collect::<Vec<u64>>());

    for pair in ledger.list().windows(2) {
        assert_eq!(pair[1].previous_hash, pair[0].hash);
    }
    for block in ledger.list() {
        assert_eq!(block.compute_hash(&Blake3Hasher), block.hash);
    }
}

#[test]
fn test_newest_first_listing() {
    let mut ledger = test_ledger();
    for _ in 0..3 {
        grant(&mut ledger, "c1");
    }
    let rev: Vec<u64> = ledger.list_newest_first().iter().map(|b| b.index).collect();
    assert_eq!(rev, vec![2, 1, 0]);
}

#[test]
fn test_tampered_action_detected_at_index() {
    let mut ledger = test_ledger();
    for _ in 0..5 {
        grant(&mut ledger, "c1");
    }
    let mut blocks = ledger.list().to_vec();
    blocks[3].action = ConsentAction::Revoke;

    let err = verify_chain(&blocks, &Blake3Hasher).unwrap_err();
    assert_eq!(err, IntegrityViolation::HashMismatch { index: 3 });
    assert_eq!(err.index(), 3);
}

#[test]
fn test_resealed_block_breaks_link() {
    let mut ledger = test_ledger();
    for _ in 0..4 {
        grant(&mut ledger, "c1");
    }
    let mut blocks = ledger.list().to_vec();
    // Rewrite block 1 consistently; block 2 still points at the old hash.
    let b1 = &blocks[1];
    blocks[1] = LedgerBlock::seal(
        &Blake3Hasher,
        1,
        b1.timestamp,
        ConsentAction::Revoke,
        b1.client_id.clone(),
        b1.client_class,
        b1.previous_hash,
    );

    let err = verify_chain(&blocks, &Blake3Hasher).unwrap_err();
    assert_eq!(err, IntegrityViolation::BrokenLink { index: 2 });
}

#[test]
fn test_dropped_block_is_index_gap() {
    let mut ledger = test_ledger();
    for _ in 0..3 {
        grant(&mut ledger, "c1");
    }
    let mut blocks = ledger.list().to_vec();
    blocks.remove(1);

    let err = verify_chain(&blocks, &Blake3Hasher).unwrap_err();
    assert_eq!(err, IntegrityViolation::IndexGap { index: 1, found: 2 });
}

#[test]
fn test_broken_chain_loads_halted() {
    let mut ledger = test_ledger();
    for _ in 0..3 {
        grant(&mut ledger, "c1");
    }
    let mut blocks = ledger.list().to_vec();
    blocks[0].timestamp += 1.0;

    let mut reloaded = Ledger::from_blocks(blocks, Arc::new(Blake3Hasher), Arc::new(FixedClock::frozen(0.0)));
    assert!(!reloaded.is_intact());
    assert_eq!(reloaded.halted().map(|v| v.index()), Some(0));

    let res = reloaded.append(ConsentAction::Grant, ClientId::from("c1"), ClientClass::Legacy);
    assert!(matches!(res, Err(KernelError::LedgerHalted(0))));
    assert_eq!(reloaded.len(), 3);
}

#[test]
fn test_push_rejects_fork_and_halts() {
    let mut ledger = test_ledger();
    let stale = ledger
        .prepare(ConsentAction::Grant, ClientId::from("c1"), ClientClass::Legacy)
        .unwrap();
    grant(&mut ledger, "c2");

    // Sealed against the old tail: would fork the chain.
    let res = ledger.push(stale);
    assert!(matches!(res, Err(KernelError::Integrity(IntegrityViolation::IndexGap { .. }))));
    assert!(ledger.halted().is_some());
    assert_eq!(ledger.len(), 1);
}

#[test]
fn test_enforce_integrity_on_intact_chain() {
    let mut ledger = test_ledger();
    grant(&mut ledger, "c1");
    assert!(ledger.enforce_integrity().is_ok());
    assert!(ledger.halted().is_none());
}

#[test]
fn test_substituted_hasher_chains() {
    let mut ledger = Ledger::new(Arc::new(LaneSumHasher), Arc::new(FixedClock::frozen(5.0)));
    for _ in 0..4 {
        ledger.append(ConsentAction::Grant, ClientId::from("c1"), ClientClass::Sovereign).unwrap();
    }
    assert!(ledger.is_intact());
    // Same blocks under a different hash function do not verify.
    assert!(verify_chain(ledger.list(), &Blake3Hasher).is_err());
}

#[test]
fn test_identical_inputs_identical_chain() {
    let build = || {
        let mut l = test_ledger();
        grant(&mut l, "c1");
        l.append(ConsentAction::Revoke, ClientId::from("c1"), ClientClass::Legacy).unwrap();
        l.head_hash()
    };
    assert_eq!(build(), build());
}

struct RecordingSink {
    seen: Arc<Mutex<Vec<u64>>>,
    fail_at: Option<u64>,
}

impl BlockSink for RecordingSink {
    fn persist(&mut self, block: &LedgerBlock) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.fail_at == Some(block.index) {
            return Err("disk full".into());
        }
        self.seen.lock().unwrap().push(block.index);
        Ok(())
    }
}

#[test]
fn test_sink_sees_every_block_before_memory() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut ledger = test_ledger().with_sink(Box::new(RecordingSink { seen: seen.clone(), fail_at: None }));
    for _ in 0..3 {
        grant(&mut ledger, "c1");
    }
    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
}

#[test]
fn test_sink_failure_leaves_chain_untouched() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut ledger = test_ledger().with_sink(Box::new(RecordingSink { seen, fail_at: Some(1) }));
    grant(&mut ledger, "c1");
    let head = ledger.head_hash();

    let res = ledger.append(ConsentAction::Revoke, ClientId::from("c1"), ClientClass::Legacy);
    assert!(matches!(res, Err(KernelError::Sink { index: 1, .. })));
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.head_hash(), head);
    // A storage failure is not an integrity failure.
    assert!(ledger.halted().is_none());
}
