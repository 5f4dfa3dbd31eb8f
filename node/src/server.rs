// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use neuro_kernel::decision::StreamRequest;
use neuro_kernel::ledger::LedgerBlock;
use neuro_kernel::proof::ProofSubmission;
use neuro_kernel::types::{AccessDecision, ClientClass, ClientId, ConsentAction};
use tower_http::cors::CorsLayer;

use crate::api::*;
use crate::config::SYSTEM_NAME;
use crate::errors::GatewayError;
use crate::gateway::SharedGateway;

pub fn build_router(state: SharedGateway, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/neuro/stream", get(legacy_stream).post(sovereign_stream))
        .route("/neuro/consent", post(update_consent))
        .route("/neuro/consent/toggle", post(toggle_consent))
        .route("/neuro/ledger", get(get_ledger))
        .route("/neuro/ledger/verify", get(verify_ledger))
        .route("/neuro/audit", get(get_audit))
        .route("/health", get(health))
        // Observability
        .route("/metrics", get(metrics_handler))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Skipping invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

fn client_or_default(state: &SharedGateway, client_id: Option<String>) -> ClientId {
    match client_id {
        Some(id) if !id.trim().is_empty() => ClientId::new(id),
        _ => state.default_client().clone(),
    }
}

fn parse_class(raw: Option<&str>) -> Result<Option<ClientClass>, GatewayError> {
    match raw {
        None => Ok(None),
        Some(s) => ClientClass::parse(s)
            .map(Some)
            .ok_or_else(|| GatewayError::InvalidInput(format!("Invalid client_class: {}", s))),
    }
}

async fn legacy_stream(
    State(state): State<SharedGateway>,
    Query(query): Query<LegacyStreamQuery>,
) -> Json<LegacyStreamResponse> {
    let request = StreamRequest::legacy(client_or_default(&state, query.client_id));
    let (_, data, audit_log) = state.stream(&request);
    Json(LegacyStreamResponse { data, audit_log })
}

/// Never rejects the body: an unreadable submission is a sovereign request
/// without a proof, which the engine denies and counts.
async fn sovereign_stream(
    State(state): State<SharedGateway>,
    payload: Result<Json<SovereignStreamRequest>, JsonRejection>,
) -> Json<SovereignStreamResponse> {
    let payload = match payload {
        Ok(Json(p)) => p,
        Err(rejection) => {
            tracing::debug!(status = %rejection.status(), "Unreadable sovereign submission");
            SovereignStreamRequest::default()
        }
    };

    let public_signals = payload.signals();
    let proof_given = !payload.is_empty();
    let client_id = client_or_default(&state, payload.client_id);
    let proof = proof_given.then(|| ProofSubmission {
        client_id: client_id.clone(),
        proof: payload.proof,
        public_signals,
    });

    let (decision, inference, audit_log) = state.stream(&StreamRequest::sovereign(client_id, proof));
    let zkp_status = match decision {
        AccessDecision::Allowed => ZKP_VALID,
        AccessDecision::Denied => ZKP_INVALID,
    };

    Json(SovereignStreamResponse {
        mode: MODE_SOVEREIGN_ZKP.to_string(),
        zkp_status: zkp_status.to_string(),
        inference,
        audit_log,
    })
}

async fn update_consent(
    State(state): State<SharedGateway>,
    Json(payload): Json<ConsentRequest>,
) -> Result<Json<ConsentResponse>, GatewayError> {
    let action = ConsentAction::parse(&payload.action)
        .ok_or_else(|| GatewayError::InvalidInput("Invalid action".to_string()))?;
    let class = parse_class(payload.client_class.as_deref())?;
    let client_id = client_or_default(&state, payload.client_id);

    let (_, new_block) = state.record_consent(client_id, class, action).await?;
    Ok(Json(ConsentResponse {
        status: "success".to_string(),
        new_block,
    }))
}

async fn toggle_consent(
    State(state): State<SharedGateway>,
    Json(payload): Json<ToggleConsentRequest>,
) -> Result<Json<ConsentResponse>, GatewayError> {
    let class = parse_class(payload.client_class.as_deref())?;
    let client_id = client_or_default(&state, payload.client_id);

    let (_, new_block) = state.toggle_consent(client_id, class).await?;
    Ok(Json(ConsentResponse {
        status: "success".to_string(),
        new_block,
    }))
}

async fn get_ledger(State(state): State<SharedGateway>) -> Json<Vec<LedgerBlock>> {
    Json(state.snapshot().blocks.clone())
}

async fn verify_ledger(State(state): State<SharedGateway>) -> Json<LedgerVerifyResponse> {
    Json(state.verify_ledger().await)
}

async fn get_audit(State(state): State<SharedGateway>) -> Json<AuditResponse> {
    Json(AuditResponse {
        denied_total: state.denied_total(),
    })
}

async fn health(State(state): State<SharedGateway>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "operational".to_string(),
        system: SYSTEM_NAME.to_string(),
        ledger_halted: state.is_halted(),
    })
}

async fn metrics_handler() -> String {
    crate::telemetry::get_metrics()
}
