//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API, plus the
//! mapping from core errors to HTTP status codes.

use axum::Json;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use plandeck_core::{
    DetectionKind, DoorToggle, LayerFlags, LayerKind, PlandeckError, ProjectRecord, StoreCounts,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// GENERIC MESSAGE & ERROR MAPPING
// =============================================================================

/// Generic success/error envelope for endpoints without a richer body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub success: bool,
    pub error: Option<String>,
}

impl ApiMessage {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
        }
    }
}

/// Map a core error to its HTTP response.
pub fn store_error(e: &PlandeckError) -> (StatusCode, Json<ApiMessage>) {
    let status = match e {
        PlandeckError::NotFound(_) => StatusCode::NOT_FOUND,
        PlandeckError::InvalidInput(_) | PlandeckError::PageOutOfRange { .. } => {
            StatusCode::BAD_REQUEST
        }
        PlandeckError::SerializationError(_) | PlandeckError::IoError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ApiMessage::error(e.to_string())))
}

/// Shorthand for a 400 with a message.
pub fn bad_request(msg: impl Into<String>) -> (StatusCode, Json<ApiMessage>) {
    (StatusCode::BAD_REQUEST, Json(ApiMessage::error(msg)))
}

/// Shorthand for a 404 with a message.
pub fn not_found(msg: impl Into<String>) -> (StatusCode, Json<ApiMessage>) {
    (StatusCode::NOT_FOUND, Json(ApiMessage::error(msg)))
}

// =============================================================================
// HEALTH & STATUS
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Workspace status response: record counts per family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub projects: usize,
    pub invoices: usize,
    pub takeoffs: usize,
    pub calendar_events: usize,
}

impl From<StoreCounts> for StatusResponse {
    fn from(counts: StoreCounts) -> Self {
        Self {
            projects: counts.projects,
            invoices: counts.invoices,
            takeoffs: counts.takeoffs,
            calendar_events: counts.calendar_events,
        }
    }
}

// =============================================================================
// PROJECTS
// =============================================================================

/// Create a project, or continue a chunked page upload into an existing
/// one when `project_id`/`chunk_index`/`total_chunks` are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub name: Option<String>,
    pub owner: Option<String>,
    #[serde(default)]
    pub pages: Vec<String>,
    pub project_id: Option<String>,
    pub chunk_index: Option<usize>,
    pub total_chunks: Option<usize>,
}

/// Rename a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameProjectRequest {
    pub name: String,
}

/// Listing row: everything but the canvas document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub page_count: usize,
}

impl From<&ProjectRecord> for ProjectSummary {
    fn from(record: &ProjectRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            owner: record.owner.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            page_count: record.canvas.page_count(),
        }
    }
}

// =============================================================================
// CANVAS: DETECTION
// =============================================================================

/// Run a detection kind against one page of a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectRequest {
    pub project_id: String,
    /// Image to analyze; defaults to the page's stored base image.
    pub image_url: Option<String>,
    pub current_page: usize,
}

/// Detection result: the hosted source image plus the overlays written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResponse {
    pub success: bool,
    pub cdn_url: Option<String>,
    #[serde(default)]
    pub overlays: BTreeMap<LayerKind, String>,
    pub error: Option<String>,
}

impl DetectResponse {
    pub fn success(cdn_url: String, overlays: BTreeMap<LayerKind, String>) -> Self {
        Self {
            success: true,
            cdn_url: Some(cdn_url),
            overlays,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            cdn_url: None,
            overlays: BTreeMap::new(),
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// CANVAS: LAYER VISIBILITY
// =============================================================================

/// Resolve the image to render for a layer toggle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerVisibilityRequest {
    pub project_id: String,
    pub layer_id: String,
    pub visible: bool,
    pub current_page: usize,
}

/// The resolved image for a layer-visibility request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerVisibilityResponse {
    pub success: bool,
    pub image_url: Option<String>,
    pub layer_id: Option<String>,
    pub visible: Option<bool>,
    pub error: Option<String>,
}

impl LayerVisibilityResponse {
    pub fn success(image_url: String, layer_id: &str, visible: bool) -> Self {
        Self {
            success: true,
            image_url: Some(image_url),
            layer_id: Some(layer_id.to_string()),
            visible: Some(visible),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            image_url: None,
            layer_id: None,
            visible: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// VIEWER SESSIONS
// =============================================================================

/// Open a viewer session for a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenViewerRequest {
    pub project_id: String,
}

/// Toggle a detection kind or a door/window sub-toggle.
/// Exactly one of `detection` / `sub_toggle` must be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerToggleRequest {
    pub detection: Option<DetectionKind>,
    pub sub_toggle: Option<DoorToggle>,
    pub enabled: bool,
}

/// Switch the session's current page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerPageRequest {
    pub page: usize,
}

/// Long-poll query for viewer status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewerWaitQuery {
    /// Wait up to this long for the resolution to change before answering.
    pub wait_ms: Option<u64>,
}

/// Full view of one session: flags, in-flight work, and the resolved layer.
#[derive(Debug, Clone, Serialize)]
pub struct ViewerSnapshot {
    pub session_id: String,
    pub project_id: String,
    pub page: usize,
    pub flags: LayerFlags,
    pub processing: Vec<DetectionKind>,
    pub resolved_layer: LayerKind,
    pub image_url: Option<String>,
    pub last_error: Option<String>,
}

// =============================================================================
// INVOICES & TAKEOFFS
// =============================================================================

/// Create an invoice or takeoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentRequest {
    pub client_name: String,
    pub client_email: String,
    pub status: Option<String>,
    pub owner: Option<String>,
}

/// Partial update of an invoice or takeoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDocumentRequest {
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub status: Option<String>,
}

/// Duplicate an existing invoice or takeoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateRequest {
    pub id: String,
}

// =============================================================================
// CALENDAR
// =============================================================================

/// Create a calendar event. `date` is `YYYY-MM-DD`; times are `HH:MM`
/// and interpreted as UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub location: Option<String>,
    pub all_day: Option<bool>,
}

/// Partial update of a calendar event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}
