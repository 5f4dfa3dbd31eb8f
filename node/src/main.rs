// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::sync::Arc;

use neuro_node::config::NodeConfig;
use neuro_node::gateway::{SharedGateway, StreamGateway};
use neuro_node::server::build_router;
use neuro_node::telemetry::init_telemetry;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    init_telemetry();

    let cfg = NodeConfig::from_env();
    tracing::info!("Initializing Neuro Gateway with config: {:?}", cfg);

    // A log that cannot be read is never papered over with an empty ledger.
    let gateway = match StreamGateway::from_config(&cfg) {
        Ok(g) => g,
        Err(e) => {
            tracing::error!("Ledger recovery failed: {}", e);
            std::process::exit(1);
        }
    };

    if gateway.is_halted() {
        tracing::error!("Consent ledger is halted. Serving read-only; consent changes will be refused.");
    }

    let shared: SharedGateway = Arc::new(gateway);
    let app = build_router(shared, &cfg.cors_origins);

    let addr = cfg.bind_addr;
    tracing::info!("Listening on {}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
