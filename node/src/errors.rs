// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use neuro_kernel::error::KernelError;
use serde_json::json;
use thiserror::Error;

use crate::ledger_store::LedgerLogError;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),
    #[error("Ledger storage error: {0}")]
    Storage(#[from] LedgerLogError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Kernel(KernelError::LedgerHalted(_)) | GatewayError::Kernel(KernelError::Integrity(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GatewayError::Kernel(KernelError::Sink { .. }) | GatewayError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            GatewayError::Kernel(KernelError::LedgerHalted(_)) | GatewayError::Kernel(KernelError::Integrity(_)) => {
                "Consent ledger halted after integrity violation".to_string()
            }
            GatewayError::Kernel(KernelError::Sink { .. }) | GatewayError::Storage(_) => {
                tracing::error!("{}", self);
                "Internal server error".to_string()
            }
            GatewayError::InvalidInput(msg) => msg.clone(),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
