//! # Viewer Session Handlers
//!
//! HTTP surface of the toggle controller. A client opens a session for a
//! project, toggles detection kinds and door/window sub-toggles, and reads
//! (or long-polls) the resolved layer the canvas should render.
//!
//! All toggle state lives server-side in the session; the snapshot returned
//! by every endpoint is the single source of truth the renderer observes.

use super::AppState;
use super::types::{
    ApiMessage, OpenViewerRequest, ViewerPageRequest, ViewerSnapshot, ViewerToggleRequest,
    ViewerWaitQuery, bad_request, not_found, store_error,
};
use crate::sessions::{self, ViewerHandle};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use plandeck_core::limits::MAX_WAIT_MS;
use std::sync::Arc;
use std::time::Duration;

/// Build the full snapshot of a session.
async fn snapshot(handle: &Arc<ViewerHandle>) -> ViewerSnapshot {
    let (flags, page, processing) = handle.observe().await;
    let resolved = handle.resolved();
    ViewerSnapshot {
        session_id: handle.id.clone(),
        project_id: handle.project_id.clone(),
        page,
        flags,
        processing,
        resolved_layer: resolved.layer,
        image_url: resolved.image_url,
        last_error: handle.last_error().await,
    }
}

/// Open a viewer session for a project.
pub async fn open_viewer_handler(
    State(state): State<AppState>,
    Json(request): Json<OpenViewerRequest>,
) -> Result<Json<ViewerSnapshot>, (StatusCode, Json<ApiMessage>)> {
    if request.project_id.is_empty() {
        return Err(bad_request("project_id is required"));
    }
    // The session is only worth opening for a project that exists.
    {
        let workspace = state.workspace.read().await;
        workspace
            .require_project(&request.project_id)
            .map_err(|e| store_error(&e))?;
    }

    let handle = state.sessions.open(&request.project_id).await;
    sessions::publish_resolution(&state, &handle)
        .await
        .map_err(|e| store_error(&e))?;

    tracing::info!(session = %handle.id, project = %handle.project_id, "opened viewer session");
    Ok(Json(snapshot(&handle).await))
}

/// Read a session's state; with `?wait_ms=` the request waits for the next
/// resolution change (or the timeout) before answering.
pub async fn viewer_status_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<ViewerWaitQuery>,
) -> Result<Json<ViewerSnapshot>, (StatusCode, Json<ApiMessage>)> {
    let handle = state
        .sessions
        .get(&session_id)
        .await
        .ok_or_else(|| not_found(format!("viewer session {session_id}")))?;

    if let Some(wait_ms) = query.wait_ms {
        let mut rx = handle.subscribe();
        // A timeout here is not an error: the client simply gets the
        // unchanged state back.
        let _ = tokio::time::timeout(
            Duration::from_millis(wait_ms.min(MAX_WAIT_MS)),
            rx.changed(),
        )
        .await;
    }

    Ok(Json(snapshot(&handle).await))
}

/// Toggle a detection kind or one door/window sub-toggle.
pub async fn viewer_toggle_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ViewerToggleRequest>,
) -> Result<Json<ViewerSnapshot>, (StatusCode, Json<ApiMessage>)> {
    let handle = state
        .sessions
        .get(&session_id)
        .await
        .ok_or_else(|| not_found(format!("viewer session {session_id}")))?;

    match (request.detection, request.sub_toggle) {
        (Some(kind), None) => {
            sessions::toggle_detection(&state, &handle, kind, request.enabled)
                .await
                .map_err(|e| store_error(&e))?;
        }
        (None, Some(which)) => {
            sessions::set_door_toggle(&state, &handle, which, request.enabled)
                .await
                .map_err(|e| store_error(&e))?;
        }
        _ => {
            return Err(bad_request(
                "exactly one of detection / sub_toggle must be set",
            ));
        }
    }

    Ok(Json(snapshot(&handle).await))
}

/// Switch the session's current page.
pub async fn viewer_page_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ViewerPageRequest>,
) -> Result<Json<ViewerSnapshot>, (StatusCode, Json<ApiMessage>)> {
    let handle = state
        .sessions
        .get(&session_id)
        .await
        .ok_or_else(|| not_found(format!("viewer session {session_id}")))?;

    sessions::set_page(&state, &handle, request.page)
        .await
        .map_err(|e| store_error(&e))?;

    Ok(Json(snapshot(&handle).await))
}

/// Close a viewer session.
pub async fn close_viewer_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ApiMessage>)> {
    if state.sessions.close(&session_id).await {
        tracing::info!(session = %session_id, "closed viewer session");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(format!("viewer session {session_id}")))
    }
}
