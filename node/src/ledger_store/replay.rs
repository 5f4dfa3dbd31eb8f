// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Ledger Replay - Authoritative Recovery
//!
//! The log file is the only source of truth. On start-up it is read back
//! frame by frame, folded into a fresh chain and consent registry, and the
//! chain is verified end to end.
//!
//! # Invariants
//! - Torn final frame (crash mid-write) → ignored, earlier blocks recovered
//! - Bad CRC or undecodable payload on a complete frame → fail closed
//! - Chain verification failure → node starts, ledger halted

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use neuro_kernel::consent::ConsentRegistry;
use neuro_kernel::ledger::{BlockHasher, Clock, Ledger, LedgerBlock};

use crate::ledger_store::log::{
    validate_header, LedgerLogError, LedgerLogWriter, Result, FRAME_HEADER_LEN, HEADER_LEN, MAX_FRAME_LEN,
};
use crate::telemetry;

/// Result of walking a log image.
#[derive(Debug, Clone)]
pub struct LogScan {
    pub blocks: Vec<LedgerBlock>,
    /// Offset of an incomplete trailing frame, if any.
    pub torn_at: Option<usize>,
    /// BLAKE3 over the clean prefix (header plus complete frames).
    pub digest: [u8; 32],
}

/// Walk an in-memory log image.
pub fn scan_log(bytes: &[u8]) -> Result<LogScan> {
    validate_header(bytes)?;

    let mut blocks = Vec::new();
    let mut offset = HEADER_LEN;
    let mut torn_at = None;

    while offset < bytes.len() {
        let rest = &bytes[offset..];
        if rest.len() < FRAME_HEADER_LEN {
            torn_at = Some(offset);
            break;
        }

        let len = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]);
        let len_check = u32::from_le_bytes([rest[4], rest[5], rest[6], rest[7]]);
        let crc = u32::from_le_bytes([rest[8], rest[9], rest[10], rest[11]]);

        // A damaged length must not pass for a torn tail.
        if len_check != !len {
            return Err(LedgerLogError::Corrupted {
                offset,
                detail: "frame length check failed".into(),
            });
        }
        if len == 0 || len > MAX_FRAME_LEN {
            return Err(LedgerLogError::Corrupted {
                offset,
                detail: format!("implausible frame length {}", len),
            });
        }

        let end = FRAME_HEADER_LEN + len as usize;
        if rest.len() < end {
            torn_at = Some(offset);
            break;
        }

        let payload = &rest[FRAME_HEADER_LEN..end];
        if crc32fast::hash(payload) != crc {
            return Err(LedgerLogError::Corrupted {
                offset,
                detail: "checksum mismatch".into(),
            });
        }

        let (block, read) = bincode::serde::decode_from_slice::<LedgerBlock, _>(payload, bincode::config::standard())
            .map_err(|e| LedgerLogError::Corrupted {
                offset,
                detail: e.to_string(),
            })?;
        if read != payload.len() {
            return Err(LedgerLogError::Corrupted {
                offset,
                detail: format!("{} trailing bytes in frame", payload.len() - read),
            });
        }

        blocks.push(block);
        offset += end;
    }

    let clean_end = torn_at.unwrap_or(bytes.len());
    Ok(LogScan {
        blocks,
        torn_at,
        digest: *blake3::hash(&bytes[..clean_end]).as_bytes(),
    })
}

/// Read a ledger log without modifying it.
pub fn read_ledger_log(path: impl AsRef<Path>) -> Result<LogScan> {
    let bytes = std::fs::read(path.as_ref())?;
    let scan = scan_log(&bytes)?;
    if let Some(offset) = scan.torn_at {
        tracing::warn!("Ignoring incomplete frame at end of log (offset {})", offset);
    }
    Ok(scan)
}

/// Full recovery from the log file.
///
/// Returns a ledger wired to the log for further appends, and the consent
/// registry folded from the recovered blocks. A chain that fails
/// verification still loads, in halted mode, so it can be inspected.
pub fn recover_ledger(
    path: impl AsRef<Path>,
    hasher: Arc<dyn BlockHasher>,
    clock: Arc<dyn Clock>,
) -> Result<(Ledger, ConsentRegistry)> {
    let start = Instant::now();
    tracing::info!("Starting ledger recovery from {:?}", path.as_ref());

    let (writer, blocks) = LedgerLogWriter::open(path)?;
    let registry = ConsentRegistry::from_blocks(&blocks);
    let ledger = Ledger::from_blocks(blocks, hasher, clock).with_sink(Box::new(writer));

    telemetry::record_replay(start.elapsed());

    match ledger.halted() {
        None => tracing::info!("Recovered {} blocks, head {}", ledger.len(), ledger.head_hash()),
        Some(v) => tracing::error!("Recovered {} blocks but chain is broken: {}", ledger.len(), v),
    }

    Ok((ledger, registry))
}
