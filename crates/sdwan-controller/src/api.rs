//! Controller HTTP surface.
//!
//! POST /        — apply impairment parameters (form-encoded)
//! GET  /health  — liveness

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Serialize;

use crate::receiver::{ApplyReport, InterfaceImpairmentReceiver};
use crate::request::{ImpairmentRequest, RawImpairmentForm};

#[derive(Clone)]
pub struct ControllerState {
    pub receiver: Arc<InterfaceImpairmentReceiver>,
}

pub fn router(state: ControllerState) -> Router {
    Router::new()
        .route("/", post(apply))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn apply(
    State(state): State<ControllerState>,
    form: Result<Form<RawImpairmentForm>, FormRejection>,
) -> Result<Json<ApplyReport>, ApiError> {
    let Form(form) = form.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let request = ImpairmentRequest::from_form(form).map_err(|e| {
        tracing::info!(error = %e, "rejected impairment request");
        ApiError::bad_request(e.to_string())
    })?;

    let receiver = state.receiver.clone();
    let report = tokio::task::spawn_blocking(move || receiver.apply(&request))
        .await
        .map_err(|e| ApiError::internal(format!("apply task failed: {e}")))?;

    Ok(Json(report))
}

// ── Error type ──────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}
