// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Logs and Prometheus metrics for the gateway.
//!
//! Metric names live here and every recording site goes through the
//! helpers below. Decision metrics carry the mode and the outcome only;
//! no client id or reason is ever attached as a label.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::Unit;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use neuro_kernel::types::{AccessDecision, AccessMode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "neuro_node=debug,neuro_kernel=info,tower_http=debug";

pub const DECISIONS_TOTAL: &str = "neuro_decisions_total";
pub const BLOCKS_COMMITTED_TOTAL: &str = "neuro_ledger_blocks_committed_total";
pub const COMMIT_DURATION: &str = "neuro_ledger_commit_duration_seconds";
pub const REPLAY_DURATION: &str = "neuro_ledger_replay_duration_seconds";
pub const LEDGER_HEIGHT: &str = "neuro_ledger_height";
pub const LEDGER_HALTED: &str = "neuro_ledger_halted";
pub const LOG_APPEND_FAILURES: &str = "neuro_ledger_log_append_failures_total";

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// `RUST_LOG` if set and valid, otherwise [`DEFAULT_LOG_FILTER`].
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Initialize telemetry (logs + metrics)
pub fn init_telemetry() {
    tracing_subscriber::registry()
        .with(log_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if PROM_HANDLE.set(handle).is_err() {
                tracing::warn!("Prometheus handle already set. Telemetry re-initialized?");
            }
        }
        // Serving continues without /metrics data.
        Err(e) => tracing::error!("Failed to install Prometheus recorder: {}", e),
    }

    metrics::describe_counter!(DECISIONS_TOTAL, "Stream decisions by mode and outcome");
    metrics::describe_counter!(BLOCKS_COMMITTED_TOTAL, "Consent blocks durably committed");
    metrics::describe_counter!(LOG_APPEND_FAILURES, "Ledger log appends that failed and were rolled back");
    metrics::describe_histogram!(COMMIT_DURATION, Unit::Seconds, "Time taken to commit a consent block");
    metrics::describe_histogram!(REPLAY_DURATION, Unit::Seconds, "Time taken to replay the ledger log");
    metrics::describe_gauge!(LEDGER_HEIGHT, "Number of blocks in the consent ledger");
    metrics::describe_gauge!(LEDGER_HALTED, "1 while the ledger refuses writes after an integrity failure");

    metrics::gauge!("neuro_node_up", 1.0);
}

fn mode_label(mode: AccessMode) -> &'static str {
    match mode {
        AccessMode::Sovereign => "sovereign",
        AccessMode::Legacy => "legacy",
    }
}

fn decision_label(decision: AccessDecision) -> &'static str {
    match decision {
        AccessDecision::Allowed => "allowed",
        AccessDecision::Denied => "denied",
    }
}

pub fn record_decision(mode: AccessMode, decision: AccessDecision) {
    metrics::counter!(DECISIONS_TOTAL, 1, "mode" => mode_label(mode), "decision" => decision_label(decision));
}

pub fn record_commit(elapsed: Duration, height: usize) {
    metrics::counter!(BLOCKS_COMMITTED_TOTAL, 1);
    metrics::histogram!(COMMIT_DURATION, elapsed.as_secs_f64());
    record_ledger_state(height, false);
}

pub fn record_ledger_state(height: usize, halted: bool) {
    metrics::gauge!(LEDGER_HEIGHT, height as f64);
    metrics::gauge!(LEDGER_HALTED, if halted { 1.0 } else { 0.0 });
}

pub fn record_replay(elapsed: Duration) {
    metrics::histogram!(REPLAY_DURATION, elapsed.as_secs_f64());
}

pub fn record_append_failure() {
    metrics::counter!(LOG_APPEND_FAILURES, 1);
}

/// Get the Prometheus handle to render metrics
pub fn get_metrics() -> String {
    match PROM_HANDLE.get() {
        Some(handle) => handle.render(),
        None => "# metrics not initialized".to_string(),
    }
}
