// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! In-memory chain with an optional durable sink.
//!
//! # Append Protocol
//! ```text
//! prepare  (seal next block from tail + clock)
//! ↓
//! sink.persist  (durable before acknowledged)
//! ↓
//! push  (re-checked against tail, then visible)
//! ```
//! A sink failure leaves the chain untouched. A block that does not link to
//! the tail halts the ledger.

use std::sync::Arc;

use crate::error::{IntegrityViolation, KernelError, KernelResult};
use crate::ledger::block::LedgerBlock;
use crate::ledger::clock::{Clock, SystemClock};
use crate::ledger::hash::{Blake3Hasher, BlockHasher};
use crate::types::{BlockHash, ClientClass, ClientId, ConsentAction};

/// Durable storage for appended blocks.
///
/// `persist` must not return until the block would survive a crash.
pub trait BlockSink: Send {
    fn persist(&mut self, block: &LedgerBlock) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Walks `blocks` from genesis and reports the first broken block.
pub fn verify_chain(blocks: &[LedgerBlock], hasher: &dyn BlockHasher) -> Result<(), IntegrityViolation> {
    let mut expected_prev = BlockHash::ZERO;

    for (pos, block) in blocks.iter().enumerate() {
        let pos = pos as u64;
        if block.index != pos {
            return Err(IntegrityViolation::IndexGap { index: pos, found: block.index });
        }
        if !block.is_sealed_by(hasher) {
            return Err(IntegrityViolation::HashMismatch { index: pos });
        }
        if block.previous_hash != expected_prev {
            return Err(IntegrityViolation::BrokenLink { index: pos });
        }
        expected_prev = block.hash;
    }

    Ok(())
}

pub struct Ledger {
    blocks: Vec<LedgerBlock>,
    hasher: Arc<dyn BlockHasher>,
    clock: Arc<dyn Clock>,
    sink: Option<Box<dyn BlockSink>>,
    halted: Option<IntegrityViolation>,
}

impl Ledger {
    pub fn new(hasher: Arc<dyn BlockHasher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            blocks: Vec::new(),
            hasher,
            clock,
            sink: None,
            halted: None,
        }
    }

    /// BLAKE3 + system clock, no durable sink.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(Blake3Hasher), Arc::new(SystemClock))
    }

    /// Rebuilds a ledger from previously persisted blocks.
    ///
    /// The chain is verified on load. A broken chain still loads (so it can
    /// be inspected) but comes up halted.
    pub fn from_blocks(blocks: Vec<LedgerBlock>, hasher: Arc<dyn BlockHasher>, clock: Arc<dyn Clock>) -> Self {
        let halted = match verify_chain(&blocks, hasher.as_ref()) {
            Ok(()) => None,
            Err(v) => {
                tracing::error!("Ledger loaded with broken chain: {}. Appends disabled.", v);
                Some(v)
            }
        };
        Self {
            blocks,
            hasher,
            clock,
            sink: None,
            halted,
        }
    }

    /// Attaches the durable sink every later append goes through.
    pub fn with_sink(mut self, sink: Box<dyn BlockSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Seals the next block without appending it.
    pub fn prepare(&self, action: ConsentAction, client_id: ClientId, client_class: ClientClass) -> KernelResult<LedgerBlock> {
        self.ensure_writable()?;
        let index = self.blocks.len() as u64;
        let previous_hash = self.head_hash();
        Ok(LedgerBlock::seal(
            self.hasher.as_ref(),
            index,
            self.clock.now(),
            action,
            client_id,
            client_class,
            previous_hash,
        ))
    }

    /// Appends a consent change and returns the new block.
    pub fn append(&mut self, action: ConsentAction, client_id: ClientId, client_class: ClientClass) -> KernelResult<LedgerBlock> {
        let block = self.prepare(action, client_id, client_class)?;

        if let Some(sink) = self.sink.as_mut() {
            sink.persist(&block).map_err(|source| KernelError::Sink { index: block.index, source })?;
        }

        self.push(block.clone())?;
        Ok(block)
    }

    /// Accepts an externally sealed block if it extends the tail exactly.
    ///
    /// Does not go through the sink.
    pub fn push(&mut self, block: LedgerBlock) -> KernelResult<()> {
        self.ensure_writable()?;

        let expected_index = self.blocks.len() as u64;
        let violation = if block.index != expected_index {
            Some(IntegrityViolation::IndexGap { index: expected_index, found: block.index })
        } else if !block.is_sealed_by(self.hasher.as_ref()) {
            Some(IntegrityViolation::HashMismatch { index: expected_index })
        } else if block.previous_hash != self.head_hash() {
            Some(IntegrityViolation::BrokenLink { index: expected_index })
        } else {
            None
        };

        if let Some(v) = violation {
            tracing::error!("Rejected block at tail: {}. Halting ledger.", v);
            self.halted = Some(v.clone());
            return Err(KernelError::Integrity(v));
        }

        self.blocks.push(block);
        Ok(())
    }

    /// Full end-to-end check of every stored block.
    pub fn verify(&self) -> Result<(), IntegrityViolation> {
        verify_chain(&self.blocks, self.hasher.as_ref())
    }

    pub fn is_intact(&self) -> bool {
        self.verify().is_ok()
    }

    /// Runs [`verify`](Self::verify) and halts the ledger on the first violation.
    pub fn enforce_integrity(&mut self) -> Result<(), IntegrityViolation> {
        let res = self.verify();
        if let Err(ref v) = res {
            if self.halted.is_none() {
                tracing::error!("Integrity check failed: {}. Halting ledger.", v);
                self.halted = Some(v.clone());
            }
        }
        res
    }

    /// Blocks oldest-first.
    pub fn list(&self) -> &[LedgerBlock] {
        &self.blocks
    }

    /// Blocks newest-first, for audit display.
    pub fn list_newest_first(&self) -> Vec<LedgerBlock> {
        self.blocks.iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Hash of the tail, or zero for an empty chain.
    pub fn head_hash(&self) -> BlockHash {
        self.blocks.last().map(|b| b.hash).unwrap_or(BlockHash::ZERO)
    }

    pub fn halted(&self) -> Option<&IntegrityViolation> {
        self.halted.as_ref()
    }

    pub fn hasher(&self) -> Arc<dyn BlockHasher> {
        self.hasher.clone()
    }

    fn ensure_writable(&self) -> KernelResult<()> {
        match &self.halted {
            Some(v) => Err(KernelError::LedgerHalted(v.index())),
            None => Ok(()),
        }
    }
}

impl core::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Ledger")
            .field("len", &self.blocks.len())
            .field("head", &self.head_hash())
            .field("halted", &self.halted)
            .field("durable", &self.sink.is_some())
            .finish()
    }
}
