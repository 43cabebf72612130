//! # Project Handlers
//!
//! Project CRUD plus the chunked page-ingest path.
//!
//! Page images are rasterized client-side and uploaded in chunks to stay
//! inside request limits. The first chunk creates the project; subsequent
//! chunks name the project id and append their pages in order. Apart from
//! the append, every write is a full-record replace.

use super::AppState;
use super::types::{
    ApiMessage, CreateProjectRequest, ProjectSummary, RenameProjectRequest, bad_request,
    store_error,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use plandeck_core::limits::MAX_PAGES_PER_CHUNK;
use plandeck_core::records::validate_name;
use plandeck_core::{CanvasDoc, ProjectRecord};

/// Fallback name for unnamed uploads.
const UNTITLED: &str = "Untitled Project";

/// Create a project, or append a chunk of pages to an existing one.
pub async fn create_project_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<Json<ProjectRecord>, (StatusCode, Json<ApiMessage>)> {
    if request.pages.len() > MAX_PAGES_PER_CHUNK {
        return Err(bad_request(format!(
            "a single chunk may carry at most {MAX_PAGES_PER_CHUNK} pages"
        )));
    }

    // Chunk continuation: project_id present means chunks 1..n of an
    // upload started by a previous request.
    if let Some(project_id) = &request.project_id {
        if request.chunk_index.is_none() || request.total_chunks.is_none() {
            return Err(bad_request(
                "chunked uploads require chunk_index and total_chunks",
            ));
        }

        let mut workspace = state.workspace.write().await;
        let mut project = workspace
            .require_project(project_id)
            .map_err(|e| store_error(&e))?;
        project
            .canvas
            .append_pages(request.pages)
            .map_err(|e| store_error(&e))?;
        project.updated_at = Utc::now();
        workspace
            .upsert_project(&project)
            .map_err(|e| store_error(&e))?;

        tracing::info!(
            project = %project.id,
            chunk = request.chunk_index,
            pages = project.canvas.page_count(),
            "appended ingest chunk"
        );
        return Ok(Json(project));
    }

    let name = request.name.unwrap_or_else(|| UNTITLED.to_string());
    validate_name("project name", &name).map_err(|e| store_error(&e))?;

    let mut canvas = CanvasDoc::new();
    canvas
        .append_pages(request.pages)
        .map_err(|e| store_error(&e))?;

    let now = Utc::now();
    let project = ProjectRecord {
        id: uuid::Uuid::new_v4().to_string(),
        name,
        owner: request.owner.unwrap_or_else(|| "default".to_string()),
        created_at: now,
        updated_at: now,
        canvas,
    };

    let mut workspace = state.workspace.write().await;
    workspace
        .upsert_project(&project)
        .map_err(|e| store_error(&e))?;

    tracing::info!(project = %project.id, name = %project.name, "created project");
    Ok(Json(project))
}

/// List all projects, newest first.
pub async fn list_projects_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectSummary>>, (StatusCode, Json<ApiMessage>)> {
    let workspace = state.workspace.read().await;
    let mut summaries: Vec<ProjectSummary> = workspace
        .projects()
        .map_err(|e| store_error(&e))?
        .iter()
        .map(ProjectSummary::from)
        .collect();
    summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(summaries))
}

/// Fetch one project with its full canvas document.
pub async fn get_project_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectRecord>, (StatusCode, Json<ApiMessage>)> {
    let workspace = state.workspace.read().await;
    let project = workspace.require_project(&id).map_err(|e| store_error(&e))?;
    Ok(Json(project))
}

/// Rename a project. Canvas mutations flow only through the ingest and
/// detection paths; a rename never touches the document.
pub async fn rename_project_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RenameProjectRequest>,
) -> Result<Json<ProjectRecord>, (StatusCode, Json<ApiMessage>)> {
    validate_name("project name", &request.name).map_err(|e| store_error(&e))?;

    let mut workspace = state.workspace.write().await;
    let mut project = workspace.require_project(&id).map_err(|e| store_error(&e))?;
    project.name = request.name;
    project.updated_at = Utc::now();
    workspace
        .upsert_project(&project)
        .map_err(|e| store_error(&e))?;
    Ok(Json(project))
}

/// Delete a project and its canvas document wholesale.
pub async fn delete_project_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ApiMessage>)> {
    let mut workspace = state.workspace.write().await;
    let existed = workspace.remove_project(&id).map_err(|e| store_error(&e))?;
    if existed {
        tracing::info!(project = %id, "deleted project");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(store_error(&plandeck_core::PlandeckError::NotFound(
            format!("project {id}"),
        )))
    }
}
