// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Durable storage for the consent ledger.
//!
//! - `log`: append-only writer, one fsync'd frame per block
//! - `replay`: reads the log back and rebuilds ledger + registry
//! - `commit`: the single writer that publishes read views

pub mod log;
pub mod replay;
pub mod commit;

pub use commit::{ConsentChange, LedgerCommitter, LedgerView, PublishedView};
pub use log::{LedgerLogError, LedgerLogWriter};
pub use replay::{read_ledger_log, recover_ledger, LogScan};
