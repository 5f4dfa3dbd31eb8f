// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Append-Only Ledger Log Writer
//!
//! A block is acknowledged only after its frame is written and fsync'd.
//! Acknowledged frames are never rewritten. Two truncations exist: a torn
//! final frame left by a crash is dropped when the file is opened, and a
//! frame whose write or fsync failed is cut back off before the error is
//! returned. If that cut fails the writer refuses every later append.
//!
//! # File Format
//! ```text
//! [Header: 16 bytes][Frame][Frame][Frame]...
//! ```
//!
//! Header:
//! - magic: [u8; 8] (`NEUROLED`)
//! - version: u32 (1)
//! - reserved: u32 (0)
//!
//! Frame:
//! - len: u32 (payload bytes)
//! - len_check: u32 (`!len`)
//! - crc32: u32 (of payload)
//! - payload: bincode-encoded `LedgerBlock`

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use neuro_kernel::ledger::{BlockSink, LedgerBlock};
use thiserror::Error;

use crate::ledger_store::replay::scan_log;
use crate::telemetry;

pub const MAGIC: [u8; 8] = *b"NEUROLED";
pub const VERSION: u32 = 1;
pub const HEADER_LEN: usize = 16;
pub const FRAME_HEADER_LEN: usize = 12;
/// Upper bound on a single encoded block. Anything larger is corruption.
pub const MAX_FRAME_LEN: u32 = 64 * 1024;

#[derive(Error, Debug)]
pub enum LedgerLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid ledger log header")]
    InvalidHeader,

    #[error("Unsupported ledger log version {0}")]
    UnsupportedVersion(u32),

    #[error("Ledger log corrupted at offset {offset}: {detail}")]
    Corrupted { offset: usize, detail: String },

    #[error("Ledger log unusable: a failed append could not be rolled back")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, LedgerLogError>;

pub fn header_bytes() -> [u8; HEADER_LEN] {
    let mut bytes = [0u8; HEADER_LEN];
    bytes[0..8].copy_from_slice(&MAGIC);
    bytes[8..12].copy_from_slice(&VERSION.to_le_bytes());
    bytes
}

pub(crate) fn validate_header(bytes: &[u8]) -> Result<()> {
    if bytes.len() < HEADER_LEN || bytes[0..8] != MAGIC {
        return Err(LedgerLogError::InvalidHeader);
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&bytes[8..12]);
    let version = u32::from_le_bytes(version);
    if version != VERSION {
        return Err(LedgerLogError::UnsupportedVersion(version));
    }
    Ok(())
}

/// Encodes one block as a complete frame.
pub fn encode_frame(block: &LedgerBlock) -> Result<Vec<u8>> {
    let payload = bincode::serde::encode_to_vec(block, bincode::config::standard())
        .map_err(|e| LedgerLogError::Serialization(e.to_string()))?;

    let len = u32::try_from(payload.len())
        .ok()
        .filter(|l| *l <= MAX_FRAME_LEN)
        .ok_or_else(|| LedgerLogError::Serialization(format!("block {} too large ({} bytes)", block.index, payload.len())))?;

    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&(!len).to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

pub struct LedgerLogWriter {
    path: PathBuf,
    file: File,
    /// Bytes on disk up to the end of the last acknowledged frame.
    len: u64,
    block_count: u64,
    poisoned: bool,
    #[cfg(test)]
    fault: Option<Fault>,
}

/// One-shot write failures for tests.
#[cfg(test)]
#[derive(Clone, Copy, Debug)]
pub(crate) enum Fault {
    /// Half the frame reaches the file, then the write errors.
    TornWrite,
    /// The whole frame is written but fsync errors.
    Sync,
    /// As `Sync`, and the rollback truncate errors too.
    SyncAndRollback,
}

impl LedgerLogWriter {
    /// Open or create a ledger log.
    ///
    /// Returns the writer positioned at the end together with every block
    /// already in the file. A torn final frame is cut off here so the next
    /// append starts on a clean boundary; corruption anywhere else is an
    /// error and nothing is opened.
    pub fn open(path: impl AsRef<Path>) -> Result<(Self, Vec<LedgerBlock>)> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        let (blocks, len) = if bytes.is_empty() {
            file.write_all(&header_bytes())?;
            file.sync_all()?;
            (Vec::new(), HEADER_LEN as u64)
        } else {
            let scan = scan_log(&bytes)?;
            let end = match scan.torn_at {
                Some(offset) => {
                    tracing::warn!(
                        "Dropping torn frame at end of {:?} (offset {}, {} bytes)",
                        path,
                        offset,
                        bytes.len() - offset
                    );
                    file.set_len(offset as u64)?;
                    file.sync_all()?;
                    offset
                }
                None => bytes.len(),
            };
            (scan.blocks, end as u64)
        };

        let block_count = blocks.len() as u64;
        Ok((
            Self {
                path,
                file,
                len,
                block_count,
                poisoned: false,
                #[cfg(test)]
                fault: None,
            },
            blocks,
        ))
    }

    /// Write one block and fsync. Only returns Ok after the frame is durable.
    ///
    /// On failure the file is truncated back to the previous frame boundary,
    /// so a retry of the same index lands where the rejected frame was.
    pub fn append(&mut self, block: &LedgerBlock) -> Result<()> {
        if self.poisoned {
            return Err(LedgerLogError::Poisoned);
        }

        let frame = encode_frame(block)?;
        match self.write_frame(&frame) {
            Ok(()) => {
                self.len += frame.len() as u64;
                self.block_count += 1;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Append of block {} to {:?} failed: {}", block.index, self.path, e);
                telemetry::record_append_failure();
                self.roll_back();
                Err(e.into())
            }
        }
    }

    fn write_frame(&mut self, frame: &[u8]) -> std::io::Result<()> {
        #[cfg(test)]
        match self.fault {
            Some(Fault::TornWrite) => {
                self.file.write_all(&frame[..frame.len() / 2])?;
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "injected torn write"));
            }
            Some(Fault::Sync) | Some(Fault::SyncAndRollback) => {
                self.file.write_all(frame)?;
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "injected fsync failure"));
            }
            None => {}
        }

        self.file.write_all(frame)?;
        self.file.sync_data()
    }

    fn roll_back(&mut self) {
        #[cfg(test)]
        if let Some(Fault::SyncAndRollback) = self.fault.take() {
            tracing::error!("Could not roll back {:?}; refusing further appends", self.path);
            self.poisoned = true;
            return;
        }

        match self.file.set_len(self.len).and_then(|_| self.file.sync_data()) {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Could not roll back {:?}: {}; refusing further appends", self.path, e);
                self.poisoned = true;
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn inject(&mut self, fault: Fault) {
        self.fault = Some(fault);
    }

    pub fn block_count(&self) -> u64 {
        self.block_count
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlockSink for LedgerLogWriter {
    fn persist(&mut self, block: &LedgerBlock) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.append(block).map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
    }
}
