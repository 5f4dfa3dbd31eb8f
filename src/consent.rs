// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Consent Registry
//!
//! A projection of the ledger: the current consent state per client is
//! whatever the latest block for that client says. The cached map is only
//! ever advanced by blocks the ledger has already accepted, so it cannot
//! diverge from `ConsentRegistry::from_blocks(ledger.list())`.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::KernelResult;
use crate::ledger::{Ledger, LedgerBlock};
use crate::types::{ClientClass, ClientId, ConsentAction};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ConsentState {
    pub client_class: ClientClass,
    pub granted: bool,
}

impl ConsentState {
    /// State of any client the ledger has never mentioned.
    pub const FAIL_CLOSED: ConsentState = ConsentState {
        client_class: ClientClass::Legacy,
        granted: false,
    };
}

#[derive(Clone, Debug, Default)]
pub struct ConsentRegistry {
    states: HashMap<ClientId, ConsentState>,
    height: u64,
}

impl ConsentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds the chain from genesis; latest action per client wins.
    pub fn from_blocks(blocks: &[LedgerBlock]) -> Self {
        let mut reg = Self::new();
        for block in blocks {
            reg.apply_block(block);
        }
        reg
    }

    pub fn apply_block(&mut self, block: &LedgerBlock) {
        self.states.insert(
            block.client_id.clone(),
            ConsentState {
                client_class: block.client_class,
                granted: block.action.grants(),
            },
        );
        self.height = block.index + 1;
    }

    pub fn current(&self, client_id: &ClientId) -> ConsentState {
        self.states.get(client_id).copied().unwrap_or(ConsentState::FAIL_CLOSED)
    }

    /// Number of ledger blocks folded into this projection.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Action a toggle would append: the opposite of the current flag.
    pub fn next_toggle_action(&self, client_id: &ClientId) -> ConsentAction {
        ConsentAction::from_granted(!self.current(client_id).granted)
    }

    /// Flip-on-call: appends GRANT if the client is currently revoked, REVOKE
    /// otherwise. The client keeps its recorded class; unknown clients are
    /// recorded as `class`.
    pub fn toggle(
        &mut self,
        ledger: &mut Ledger,
        client_id: &ClientId,
        class: Option<ClientClass>,
    ) -> KernelResult<(ConsentState, LedgerBlock)> {
        let action = self.next_toggle_action(client_id);
        let class = class.unwrap_or_else(|| self.known_class(client_id));
        self.record(ledger, client_id, class, action)
    }

    /// Appends an explicit action. Repeating an action appends another block
    /// but converges to the same state.
    pub fn record(
        &mut self,
        ledger: &mut Ledger,
        client_id: &ClientId,
        class: ClientClass,
        action: ConsentAction,
    ) -> KernelResult<(ConsentState, LedgerBlock)> {
        let block = ledger.append(action, client_id.clone(), class)?;
        self.apply_block(&block);
        Ok((self.current(client_id), block))
    }

    pub fn clients(&self) -> impl Iterator<Item = (&ClientId, &ConsentState)> {
        self.states.iter()
    }

    fn known_class(&self, client_id: &ClientId) -> ClientClass {
        self.states
            .get(client_id)
            .map(|s| s.client_class)
            .unwrap_or_default()
    }
}
