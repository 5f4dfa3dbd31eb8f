// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use serde::Serialize;
use thiserror::Error;

/// A hash or link mismatch found while walking the chain.
///
/// Fatal for the ledger instance that observed it: appends stop until an
/// operator intervenes.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityViolation {
    #[error("block {index}: index out of sequence (found {found})")]
    IndexGap { index: u64, found: u64 },

    #[error("block {index}: stored hash does not match block contents")]
    HashMismatch { index: u64 },

    #[error("block {index}: previous_hash does not link to predecessor")]
    BrokenLink { index: u64 },
}

impl IntegrityViolation {
    /// Position of the offending block in the chain.
    pub fn index(&self) -> u64 {
        match self {
            IntegrityViolation::IndexGap { index, .. }
            | IntegrityViolation::HashMismatch { index }
            | IntegrityViolation::BrokenLink { index } => *index,
        }
    }
}

#[derive(Error, Debug)]
pub enum KernelError {
    #[error("ledger integrity violated: {0}")]
    Integrity(#[from] IntegrityViolation),

    #[error("ledger halted after integrity violation at block {0}")]
    LedgerHalted(u64),

    #[error("durable write of block {index} failed: {source}")]
    Sink {
        index: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type KernelResult<T> = core::result::Result<T, KernelError>;
