//! # Plandeck HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET  /health` - Health check
//! - `GET  /status` - Workspace record counts
//! - `POST /projects` - Create a project / append an ingest chunk
//! - `GET  /projects` - List projects
//! - `GET|PATCH|DELETE /projects/{id}` - Single project operations
//! - `POST /canvas/detect/{kind}` - Run one detection kind on a page
//! - `POST /canvas/layer-visibility` - Resolve a layer to an image URL
//! - `POST /canvas/viewer` - Open a viewer session
//! - `GET|DELETE /canvas/viewer/{session}` - Observe / close a session
//! - `POST /canvas/viewer/{session}/toggle` - Toggle a detection layer
//! - `POST /canvas/viewer/{session}/page` - Switch the session's page
//! - `POST|GET /invoices`, `/takeoffs`, `/calendar` + `{id}` routes - CRUD
//! - `POST /invoices/duplicate`, `/takeoffs/duplicate` - Duplicate
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `PLANDECK_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `PLANDECK_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `PLANDECK_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod calendar;
mod canvas;
mod ledger;
mod middleware;
mod projects;
mod system;
pub mod types;
mod viewer;

// Re-exports for external use
pub use auth::get_api_key_from_env;
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};

use crate::services::{CdnClient, DetectionClient, ServiceConfig};
use crate::sessions::ViewerSessions;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use plandeck_core::{PlandeckError, Workspace};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Body limit for page-ingest and detection routes, whose payloads may
/// carry data URLs.
const INGEST_BODY_LIMIT: usize = 16 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the record store, the viewer session registry, and
/// the outbound service clients.
#[derive(Clone)]
pub struct AppState {
    /// The workspace record store.
    pub workspace: Arc<RwLock<Workspace>>,
    /// Open viewer sessions.
    pub sessions: Arc<ViewerSessions>,
    /// CDN upload client.
    pub cdn: CdnClient,
    /// Detection service client.
    pub detect: DetectionClient,
}

impl AppState {
    /// Create new app state over a workspace and service configuration.
    #[must_use]
    pub fn new(workspace: Workspace, services: &ServiceConfig) -> Self {
        Self {
            workspace: Arc::new(RwLock::new(workspace)),
            sessions: Arc::new(ViewerSessions::new()),
            cdn: CdnClient::new(services),
            detect: DetectionClient::new(services),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `PLANDECK_CORS_ORIGINS` environment variable:
/// - If "*": allows all origins (development mode - use with caution!)
/// - If not set: defaults to localhost only (restrictive default)
/// - Otherwise: parses comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("PLANDECK_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (PLANDECK_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in PLANDECK_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([
                        Method::GET,
                        Method::POST,
                        Method::PATCH,
                        Method::DELETE,
                        Method::OPTIONS,
                    ])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No PLANDECK_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let localhost_origins = vec![
        "http://localhost:3000".parse::<HeaderValue>().ok(),
        "http://localhost:8080".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3000".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:8080".parse::<HeaderValue>().ok(),
    ];
    let origins: Vec<HeaderValue> = localhost_origins.into_iter().flatten().collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. CORS - handles preflight requests
/// 2. Tracing - logs all requests
/// 3. Rate Limiting - protects against DoS (if enabled)
/// 4. Authentication - validates API key (if configured)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    // Check if rate limiting is enabled
    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible! \
             Set PLANDECK_API_KEY environment variable to enable authentication."
        );
    }

    // Routes that accept page payloads get the larger body limit.
    let ingest_routes = Router::new()
        .route(
            "/projects",
            post(projects::create_project_handler).get(projects::list_projects_handler),
        )
        .route("/canvas/detect/{kind}", post(canvas::detect_handler))
        .route_layer(DefaultBodyLimit::max(INGEST_BODY_LIMIT));

    let mut router = Router::new()
        .route("/health", get(system::health_handler))
        .route("/status", get(system::status_handler))
        .route(
            "/projects/{id}",
            get(projects::get_project_handler)
                .patch(projects::rename_project_handler)
                .delete(projects::delete_project_handler),
        )
        .route(
            "/canvas/layer-visibility",
            post(canvas::layer_visibility_handler),
        )
        .route("/canvas/viewer", post(viewer::open_viewer_handler))
        .route(
            "/canvas/viewer/{session}",
            get(viewer::viewer_status_handler).delete(viewer::close_viewer_handler),
        )
        .route(
            "/canvas/viewer/{session}/toggle",
            post(viewer::viewer_toggle_handler),
        )
        .route(
            "/canvas/viewer/{session}/page",
            post(viewer::viewer_page_handler),
        )
        .route(
            "/invoices",
            post(ledger::create_invoice_handler).get(ledger::list_invoices_handler),
        )
        .route(
            "/invoices/duplicate",
            post(ledger::duplicate_invoice_handler),
        )
        .route(
            "/invoices/{id}",
            get(ledger::get_invoice_handler)
                .patch(ledger::update_invoice_handler)
                .delete(ledger::delete_invoice_handler),
        )
        .route(
            "/takeoffs",
            post(ledger::create_takeoff_handler).get(ledger::list_takeoffs_handler),
        )
        .route(
            "/takeoffs/duplicate",
            post(ledger::duplicate_takeoff_handler),
        )
        .route(
            "/takeoffs/{id}",
            get(ledger::get_takeoff_handler)
                .patch(ledger::update_takeoff_handler)
                .delete(ledger::delete_takeoff_handler),
        )
        .route(
            "/calendar",
            post(calendar::create_event_handler).get(calendar::list_events_handler),
        )
        .route(
            "/calendar/{id}",
            get(calendar::get_event_handler)
                .patch(calendar::update_event_handler)
                .delete(calendar::delete_event_handler),
        )
        .merge(ingest_routes);

    // Apply authentication middleware (innermost - runs last on request)
    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    // Apply rate limiting middleware
    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    // Apply CORS, default body limit, and tracing (outermost layers)
    router
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(
    addr: &str,
    workspace: Workspace,
    services: &ServiceConfig,
) -> Result<(), PlandeckError> {
    let state = AppState::new(workspace, services);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| PlandeckError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Plandeck HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| PlandeckError::IoError(format!("Server error: {}", e)))
}
