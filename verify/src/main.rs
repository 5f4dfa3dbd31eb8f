// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use neuro_kernel::consent::{ConsentRegistry, ConsentState};
use neuro_kernel::error::IntegrityViolation;
use neuro_kernel::ledger::{verify_chain, Blake3Hasher};
use neuro_kernel::types::BlockHash;
use neuro_node::ledger_store::log::VERSION;
use neuro_node::ledger_store::read_ledger_log;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(author, version, about = "Offline integrity check for a consent ledger log", long_about = None)]
struct Args {
    /// Path to the ledger log (e.g. data/consent.ledger)
    ledger: PathBuf,

    /// Include the consent state each client ends up with
    #[arg(long)]
    clients: bool,
}

#[derive(Serialize, Debug)]
struct Report {
    format_version: u32,
    blocks: u64,
    torn_tail: bool,
    /// BLAKE3 of the header and every complete frame.
    log_digest: String,
    head_hash: BlockHash,
    intact: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    violation: Option<IntegrityViolation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    clients: Option<BTreeMap<String, ConsentState>>,
}

fn build_report(path: &Path, with_clients: bool) -> Result<Report> {
    let scan = read_ledger_log(path).with_context(|| format!("Failed to read ledger log {:?}", path))?;

    let verdict = verify_chain(&scan.blocks, &Blake3Hasher);
    let head_hash = scan.blocks.last().map(|b| b.hash).unwrap_or(BlockHash::ZERO);

    let clients = with_clients.then(|| {
        let registry = ConsentRegistry::from_blocks(&scan.blocks);
        registry
            .clients()
            .map(|(id, state)| (id.to_string(), *state))
            .collect()
    });

    Ok(Report {
        format_version: VERSION,
        blocks: scan.blocks.len() as u64,
        torn_tail: scan.torn_at.is_some(),
        log_digest: hex::encode(scan.digest),
        head_hash,
        intact: verdict.is_ok(),
        violation: verdict.err(),
        clients,
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    eprintln!("Neuro Ledger Verifier v{}", env!("CARGO_PKG_VERSION"));

    let report = build_report(&args.ledger, args.clients)?;

    let json = serde_json::to_string_pretty(&report)?;
    println!("{}", json);

    if !report.intact {
        std::process::exit(2);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuro_kernel::ledger::{LedgerBlock, SystemClock};
    use neuro_kernel::types::{ClientClass, ClientId, ConsentAction};
    use neuro_node::ledger_store::log::{encode_frame, header_bytes};
    use neuro_node::ledger_store::recover_ledger;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn write_log(path: &Path, blocks: &[LedgerBlock]) {
        let mut bytes = header_bytes().to_vec();
        for b in blocks {
            bytes.extend(encode_frame(b).unwrap());
        }
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_report_on_clean_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("consent.ledger");
        {
            let (mut ledger, _) = recover_ledger(&path, Arc::new(Blake3Hasher), Arc::new(SystemClock)).unwrap();
            ledger.append(ConsentAction::Grant, ClientId::from("c1"), ClientClass::Legacy).unwrap();
            ledger.append(ConsentAction::Grant, ClientId::from("c2"), ClientClass::Sovereign).unwrap();
            ledger.append(ConsentAction::Revoke, ClientId::from("c1"), ClientClass::Legacy).unwrap();
        }

        let report = build_report(&path, true).unwrap();
        assert!(report.intact);
        assert_eq!(report.blocks, 3);
        assert!(!report.torn_tail);
        assert_eq!(report.log_digest.len(), 64);

        let clients = report.clients.unwrap();
        assert!(!clients["c1"].granted);
        assert!(clients["c2"].granted);
    }

    #[test]
    fn test_report_names_broken_block() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("consent.ledger");

        let mut ledger = neuro_kernel::ledger::Ledger::in_memory();
        for _ in 0..4 {
            ledger.append(ConsentAction::Grant, ClientId::from("c1"), ClientClass::Legacy).unwrap();
        }
        let mut blocks = ledger.list().to_vec();
        blocks.remove(2);
        write_log(&path, &blocks);

        let report = build_report(&path, false).unwrap();
        assert!(!report.intact);
        assert_eq!(report.violation, Some(IntegrityViolation::IndexGap { index: 2, found: 3 }));
        assert!(report.clients.is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["violation"]["kind"], "index_gap");
    }

    #[test]
    fn test_unreadable_log_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.ledger");
        assert!(build_report(&path, false).is_err());
    }
}
