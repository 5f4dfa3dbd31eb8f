// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! neuro-kernel: consent ledger, proof verification and access decisions for
//! biometric telemetry.

pub mod error;
pub mod types;
pub mod ledger;
pub mod consent;
pub mod proof;
pub mod signal;
pub mod decision;

#[cfg(test)]
pub mod tests;
