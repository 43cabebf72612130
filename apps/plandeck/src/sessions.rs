//! # Viewer Sessions
//!
//! Server-side owners of the canvas viewer's toggle state. One session is
//! opened per viewer; it holds the pure [`ViewerState`] machine, the
//! resolved-layer watch channel observers subscribe to, and the abort
//! handles of in-flight detection tasks.
//!
//! There is no process-wide event bus: the session owns the visibility
//! flags and the resolved URL, and the renderer observes them through the
//! watch channel (or a long-poll on top of it).
//!
//! Sessions are volatile. They live in a process-local map, are never
//! persisted, and a client reload simply opens a fresh session with every
//! flag off.

use crate::api::AppState;
use crate::services::ServiceError;
use chrono::Utc;
use plandeck_core::{
    Completion, DetectionKind, DoorToggle, Enable, LayerFlags, LayerKind, PlandeckError,
    ViewerState, resolve_url,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, watch};

// =============================================================================
// RESOLVED LAYER
// =============================================================================

/// What the viewer should currently render: one layer, one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLayer {
    pub page: usize,
    pub layer: LayerKind,
    /// `None` only when the page itself does not exist.
    pub image_url: Option<String>,
}

impl ResolvedLayer {
    fn empty() -> Self {
        Self {
            page: 0,
            layer: LayerKind::Pages,
            image_url: None,
        }
    }
}

// =============================================================================
// VIEWER HANDLE
// =============================================================================

/// One open viewer session.
pub struct ViewerHandle {
    pub id: String,
    pub project_id: String,
    state: Mutex<ViewerState>,
    resolved_tx: watch::Sender<ResolvedLayer>,
    last_error: Mutex<Option<String>>,
    tasks: Mutex<BTreeMap<DetectionKind, tokio::task::AbortHandle>>,
}

impl ViewerHandle {
    fn new(id: String, project_id: String) -> Self {
        let (resolved_tx, _) = watch::channel(ResolvedLayer::empty());
        Self {
            id,
            project_id,
            state: Mutex::new(ViewerState::new()),
            resolved_tx,
            last_error: Mutex::new(None),
            tasks: Mutex::new(BTreeMap::new()),
        }
    }

    /// Subscribe to resolved-layer changes.
    pub fn subscribe(&self) -> watch::Receiver<ResolvedLayer> {
        self.resolved_tx.subscribe()
    }

    /// The most recently published resolution.
    pub fn resolved(&self) -> ResolvedLayer {
        self.resolved_tx.borrow().clone()
    }

    /// The most recent detection failure, if any.
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.lock().await.clone()
    }

    /// Flags, page, and processing set in one consistent read.
    pub async fn observe(&self) -> (LayerFlags, usize, Vec<DetectionKind>) {
        let state = self.state.lock().await;
        (*state.flags(), state.current_page(), state.processing())
    }

    async fn abort_all_tasks(&self) {
        for (_, task) in std::mem::take(&mut *self.tasks.lock().await) {
            task.abort();
        }
    }
}

// =============================================================================
// SESSION REGISTRY
// =============================================================================

/// Process-local registry of open viewer sessions.
#[derive(Default)]
pub struct ViewerSessions {
    inner: RwLock<BTreeMap<String, Arc<ViewerHandle>>>,
}

impl ViewerSessions {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new session for a project.
    pub async fn open(&self, project_id: &str) -> Arc<ViewerHandle> {
        let id = uuid::Uuid::new_v4().to_string();
        let handle = Arc::new(ViewerHandle::new(id.clone(), project_id.to_string()));
        self.inner.write().await.insert(id, handle.clone());
        handle
    }

    /// Look up an open session.
    pub async fn get(&self, id: &str) -> Option<Arc<ViewerHandle>> {
        self.inner.read().await.get(id).cloned()
    }

    /// Close a session, aborting any in-flight detection tasks.
    /// Returns whether the session existed.
    pub async fn close(&self, id: &str) -> bool {
        let removed = self.inner.write().await.remove(id);
        match removed {
            Some(handle) => {
                handle.abort_all_tasks().await;
                true
            }
            None => false,
        }
    }
}

// =============================================================================
// DRIVER
// =============================================================================

/// Switch the session to another page and republish the resolution.
pub async fn set_page(
    state: &AppState,
    handle: &Arc<ViewerHandle>,
    page: usize,
) -> Result<(), PlandeckError> {
    handle.state.lock().await.set_page(page);
    publish_resolution(state, handle).await
}

/// Flip one door/window sub-toggle and republish the resolution.
pub async fn set_door_toggle(
    state: &AppState,
    handle: &Arc<ViewerHandle>,
    which: DoorToggle,
    on: bool,
) -> Result<(), PlandeckError> {
    handle.state.lock().await.set_door_toggle(which, on);
    publish_resolution(state, handle).await
}

/// Enable or disable a detection kind.
///
/// The first enable of a kind in a session issues the external detection
/// call as a background task; the toggle request itself returns
/// immediately with the kind in `Activating`. Disabling aborts any
/// in-flight task for the kind. Even if the abort loses the race, the
/// state machine's sequence guard discards the stale completion.
pub async fn toggle_detection(
    state: &AppState,
    handle: &Arc<ViewerHandle>,
    kind: DetectionKind,
    enabled: bool,
) -> Result<(), PlandeckError> {
    if enabled {
        let outcome = handle.state.lock().await.enable(kind);
        if let Enable::StartDetection { seq } = outcome {
            let task = tokio::spawn(run_detection(state.clone(), handle.clone(), kind, seq));
            handle.tasks.lock().await.insert(kind, task.abort_handle());
        }
    } else {
        if let Some(task) = handle.tasks.lock().await.remove(&kind) {
            task.abort();
        }
        handle.state.lock().await.disable(kind);
    }
    publish_resolution(state, handle).await
}

/// The background detection flow for one activation.
async fn run_detection(state: AppState, handle: Arc<ViewerHandle>, kind: DetectionKind, seq: u64) {
    match perform_detection(&state, &handle, kind).await {
        Ok(()) => {
            let outcome = handle.state.lock().await.complete(kind, seq);
            if outcome == Completion::Applied {
                *handle.last_error.lock().await = None;
                if let Err(e) = publish_resolution(&state, &handle).await {
                    tracing::error!(session = %handle.id, error = %e, "resolution publish failed");
                }
            } else {
                tracing::debug!(
                    session = %handle.id,
                    kind = kind.as_str(),
                    seq,
                    "discarding stale detection completion"
                );
            }
        }
        Err(message) => {
            let outcome = handle.state.lock().await.fail(kind, seq);
            if outcome == Completion::Applied {
                tracing::warn!(
                    session = %handle.id,
                    kind = kind.as_str(),
                    error = %message,
                    "detection failed; layer stays off"
                );
                *handle.last_error.lock().await = Some(message);
                if let Err(e) = publish_resolution(&state, &handle).await {
                    tracing::error!(session = %handle.id, error = %e, "resolution publish failed");
                }
            }
        }
    }
}

/// Upload the current page image, call the detection service, and persist
/// the returned overlays. Errors are rendered to the user-visible
/// notification string.
async fn perform_detection(
    state: &AppState,
    handle: &Arc<ViewerHandle>,
    kind: DetectionKind,
) -> Result<(), String> {
    let page = handle.state.lock().await.current_page();

    let base = {
        let workspace = state.workspace.read().await;
        let project = workspace
            .require_project(&handle.project_id)
            .map_err(|e| e.to_string())?;
        project
            .canvas
            .base_url(page)
            .map(str::to_string)
            .ok_or_else(|| "No image found for the current page".to_string())?
    };

    let cdn_url = state
        .cdn
        .upload_image(&base)
        .await
        .map_err(|e: ServiceError| e.to_string())?;
    let outputs = state
        .detect
        .detect(kind, &cdn_url)
        .await
        .map_err(|e| e.to_string())?;

    // Read-modify-write of the project record; last write wins by contract.
    let mut workspace = state.workspace.write().await;
    let mut project = workspace
        .require_project(&handle.project_id)
        .map_err(|e| e.to_string())?;
    project
        .canvas
        .set_base(page, cdn_url)
        .map_err(|e| e.to_string())?;
    for (layer, url) in outputs {
        project
            .canvas
            .set_overlay(page, layer, url)
            .map_err(|e| e.to_string())?;
    }
    project.updated_at = Utc::now();
    workspace
        .upsert_project(&project)
        .map_err(|e| e.to_string())?;
    Ok(())
}

/// Recompute the resolved layer from the current flags and document, and
/// publish it on the session's watch channel.
pub async fn publish_resolution(
    state: &AppState,
    handle: &Arc<ViewerHandle>,
) -> Result<(), PlandeckError> {
    let (flags, page) = {
        let s = handle.state.lock().await;
        (*s.flags(), s.current_page())
    };
    let workspace = state.workspace.read().await;
    let project = workspace.require_project(&handle.project_id)?;
    let (layer, url) = resolve_url(page, &flags, &project.canvas);
    handle.resolved_tx.send_replace(ResolvedLayer {
        page,
        layer,
        image_url: url.map(str::to_string),
    });
    Ok(())
}
