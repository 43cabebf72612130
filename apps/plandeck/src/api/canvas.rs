//! # Canvas Handlers
//!
//! The two canvas API boundaries:
//! - `POST /canvas/detect/{kind}`: upload the page image to the CDN, call
//!   the detection service for the kind, and record the returned overlay
//!   URLs on the project.
//! - `POST /canvas/layer-visibility`: turn a layer id plus page index into
//!   the concrete image URL to render, falling back to the base page when
//!   the layer has no data.

use super::AppState;
use super::types::{
    ApiMessage, DetectRequest, DetectResponse, LayerVisibilityRequest, LayerVisibilityResponse,
    bad_request, not_found, store_error,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use plandeck_core::{DetectionKind, LayerKind};
use std::collections::BTreeMap;

// =============================================================================
// DETECTION
// =============================================================================

/// Run one detection kind against one page of a project.
pub async fn detect_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(request): Json<DetectRequest>,
) -> Result<Json<DetectResponse>, (StatusCode, Json<ApiMessage>)> {
    let Some(kind) = DetectionKind::parse(&kind) else {
        return Err(bad_request(format!("unknown detection kind: {kind}")));
    };
    if request.project_id.is_empty() {
        return Err(bad_request("project_id is required"));
    }

    // Resolve the source image: an explicit URL from the client, or the
    // page's stored base image.
    let page = request.current_page;
    let source = {
        let workspace = state.workspace.read().await;
        let project = workspace
            .require_project(&request.project_id)
            .map_err(|e| store_error(&e))?;
        if page >= project.canvas.page_count() {
            return Err(bad_request(format!(
                "page {page} out of range for {} pages",
                project.canvas.page_count()
            )));
        }
        match request.image_url {
            Some(url) if !url.is_empty() => url,
            _ => project
                .canvas
                .base_url(page)
                .map(str::to_string)
                .ok_or_else(|| bad_request("page has no image"))?,
        }
    };

    let cdn_url = state.cdn.upload_image(&source).await.map_err(|e| {
        tracing::warn!(kind = kind.as_str(), error = %e, "CDN upload failed");
        (
            StatusCode::BAD_GATEWAY,
            Json(ApiMessage::error(format!("upload failed: {e}"))),
        )
    })?;

    let outputs = state.detect.detect(kind, &cdn_url).await.map_err(|e| {
        tracing::warn!(kind = kind.as_str(), error = %e, "detection call failed");
        (
            StatusCode::BAD_GATEWAY,
            Json(ApiMessage::error(format!("detection failed: {e}"))),
        )
    })?;

    // Record the hosted source and the overlays. Read-modify-write; last
    // write wins by contract.
    let mut workspace = state.workspace.write().await;
    let mut project = workspace
        .require_project(&request.project_id)
        .map_err(|e| store_error(&e))?;
    project
        .canvas
        .set_base(page, cdn_url.clone())
        .map_err(|e| store_error(&e))?;

    let mut written = BTreeMap::new();
    for (layer, url) in outputs {
        project
            .canvas
            .set_overlay(page, layer, url.clone())
            .map_err(|e| store_error(&e))?;
        if !url.is_empty() {
            written.insert(layer, url);
        }
    }
    project.updated_at = Utc::now();
    workspace
        .upsert_project(&project)
        .map_err(|e| store_error(&e))?;

    tracing::info!(
        project = %request.project_id,
        kind = kind.as_str(),
        page,
        overlays = written.len(),
        "detection complete"
    );
    Ok(Json(DetectResponse::success(cdn_url, written)))
}

// =============================================================================
// LAYER VISIBILITY
// =============================================================================

/// Resolve the concrete image for a layer toggle.
///
/// Unknown layer ids resolve as the base page rather than erroring; a
/// missing overlay likewise falls back to the base page. Only when even the
/// base page is absent does the request fail.
pub async fn layer_visibility_handler(
    State(state): State<AppState>,
    Json(request): Json<LayerVisibilityRequest>,
) -> Result<Json<LayerVisibilityResponse>, (StatusCode, Json<ApiMessage>)> {
    if request.project_id.is_empty() || request.layer_id.is_empty() {
        return Err(bad_request("project_id and layer_id are required"));
    }

    let kind = LayerKind::parse(&request.layer_id).unwrap_or(LayerKind::Pages);

    let workspace = state.workspace.read().await;
    let project = workspace
        .require_project(&request.project_id)
        .map_err(|e| store_error(&e))?;

    let page = request.current_page;
    let mut image_url = if request.visible {
        project.canvas.layer_url(page, kind).map(str::to_string)
    } else {
        None
    };

    // Fall back to the base page image when the layer has nothing to show.
    if image_url.is_none() && kind != LayerKind::Pages {
        image_url = project.canvas.base_url(page).map(str::to_string);
    }

    match image_url {
        Some(url) => Ok(Json(LayerVisibilityResponse::success(
            url,
            kind.as_str(),
            request.visible,
        ))),
        None => Err(not_found("No valid image found")),
    }
}
