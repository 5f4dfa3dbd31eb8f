// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Ledger Commit - the single writer
//!
//! Every consent change goes through `LedgerCommitter::commit`:
//! 1. Next block computed from the tail and the clock
//! 2. Frame written and fsync'd (when the ledger has a log attached)
//! 3. Block pushed onto the in-memory chain
//! 4. Registry projection updated
//! 5. New read view published
//!
//! A failure before step 3 leaves chain, registry and view untouched.
//! Readers never lock the committer; they clone the published `Arc`.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use neuro_kernel::consent::{ConsentRegistry, ConsentState};
use neuro_kernel::error::{IntegrityViolation, KernelResult};
use neuro_kernel::ledger::{verify_chain, BlockHasher, Ledger, LedgerBlock};
use neuro_kernel::types::{BlockHash, ClientClass, ClientId, ConsentAction};

use crate::telemetry;

/// Immutable snapshot of the ledger as of one commit.
#[derive(Debug, Clone)]
pub struct LedgerView {
    pub blocks: Vec<LedgerBlock>,
    pub registry: ConsentRegistry,
    pub halted: Option<IntegrityViolation>,
}

impl LedgerView {
    fn capture(ledger: &Ledger, registry: &ConsentRegistry) -> Self {
        Self {
            blocks: ledger.list().to_vec(),
            registry: registry.clone(),
            halted: ledger.halted().cloned(),
        }
    }

    pub fn height(&self) -> u64 {
        self.blocks.len() as u64
    }

    pub fn head_hash(&self) -> BlockHash {
        self.blocks.last().map(|b| b.hash).unwrap_or(BlockHash::ZERO)
    }

    /// Recheck the captured chain.
    pub fn verify(&self, hasher: &dyn BlockHasher) -> Result<(), IntegrityViolation> {
        verify_chain(&self.blocks, hasher)
    }
}

/// Pointer to the latest view. Swapped whole, never mutated in place.
#[derive(Debug)]
pub struct PublishedView(RwLock<Arc<LedgerView>>);

impl PublishedView {
    fn new(view: LedgerView) -> Self {
        Self(RwLock::new(Arc::new(view)))
    }

    pub fn load(&self) -> Arc<LedgerView> {
        // A panicked writer cannot leave a half-built view: the Arc is
        // replaced in one assignment.
        match self.0.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn store(&self, view: LedgerView) {
        let view = Arc::new(view);
        match self.0.write() {
            Ok(mut guard) => *guard = view,
            Err(poisoned) => *poisoned.into_inner() = view,
        }
    }
}

/// What a commit should do to a client's consent.
#[derive(Debug, Clone)]
pub enum ConsentChange {
    /// Flip the current flag.
    Toggle {
        client_id: ClientId,
        class: Option<ClientClass>,
    },
    /// Append exactly this action.
    Record {
        client_id: ClientId,
        class: ClientClass,
        action: ConsentAction,
    },
}

pub struct LedgerCommitter {
    ledger: Ledger,
    registry: ConsentRegistry,
    view: Arc<PublishedView>,
}

impl LedgerCommitter {
    pub fn new(ledger: Ledger, registry: ConsentRegistry) -> Self {
        let view = Arc::new(PublishedView::new(LedgerView::capture(&ledger, &registry)));
        telemetry::record_ledger_state(ledger.len(), ledger.halted().is_some());
        Self { ledger, registry, view }
    }

    /// Shared handle readers use to take snapshots.
    pub fn view(&self) -> Arc<PublishedView> {
        self.view.clone()
    }

    pub fn commit(&mut self, change: ConsentChange) -> KernelResult<(ConsentState, LedgerBlock)> {
        let start = Instant::now();

        let result = match &change {
            ConsentChange::Toggle { client_id, class } => self.registry.toggle(&mut self.ledger, client_id, *class),
            ConsentChange::Record { client_id, class, action } => {
                self.registry.record(&mut self.ledger, client_id, *class, *action)
            }
        };

        match &result {
            Ok((state, block)) => {
                telemetry::record_commit(start.elapsed(), self.ledger.len());
                tracing::debug!(
                    index = block.index,
                    client = %block.client_id,
                    action = block.action.as_str(),
                    granted = state.granted,
                    "Consent block committed"
                );
                self.publish();
            }
            Err(e) => {
                tracing::warn!("Consent change rejected: {}", e);
                // A rejected push may have just halted the ledger.
                if self.ledger.halted().is_some() && self.view.load().halted.is_none() {
                    self.publish();
                }
            }
        }

        result
    }

    /// Full chain check. A violation halts the ledger and is published.
    pub fn enforce_integrity(&mut self) -> Result<(), IntegrityViolation> {
        let was_halted = self.ledger.halted().is_some();
        let res = self.ledger.enforce_integrity();
        if self.ledger.halted().is_some() != was_halted {
            self.publish();
        }
        res
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn registry(&self) -> &ConsentRegistry {
        &self.registry
    }

    fn publish(&self) {
        telemetry::record_ledger_state(self.ledger.len(), self.ledger.halted().is_some());
        self.view.store(LedgerView::capture(&self.ledger, &self.registry));
    }
}
