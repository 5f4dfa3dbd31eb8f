// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Hash-Chained Consent Ledger
//!
//! The ledger is the single mutation point of the kernel. Every consent
//! change becomes an immutable [`LedgerBlock`] linked to its predecessor by
//! hash. Everything else (the consent projection, the HTTP views) is derived
//! from it.
//!
//! # Invariants
//! - `index` runs `0..len` with no gaps
//! - block 0 links to [`BlockHash::ZERO`](crate::types::BlockHash::ZERO)
//! - `hash` recomputes from the block's own fields
//! - a block reaches memory only after its sink (if any) acknowledged it

pub mod block;
pub mod hash;
pub mod clock;
pub mod chain;

pub use block::LedgerBlock;
pub use hash::{BlockHasher, Blake3Hasher};
pub use clock::{Clock, FixedClock, SystemClock};
pub use chain::{verify_chain, BlockSink, Ledger};
