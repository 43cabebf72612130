//! # System Handlers
//!
//! Health check and workspace status endpoints.

use super::AppState;
use super::types::{ApiMessage, HealthResponse, StatusResponse, store_error};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Get workspace record counts.
pub async fn status_handler(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ApiMessage>)> {
    let workspace = state.workspace.read().await;
    let counts = workspace.counts().map_err(|e| store_error(&e))?;
    Ok(Json(StatusResponse::from(counts)))
}
