//! # Outbound Service Clients
//!
//! HTTP clients for the two external collaborators:
//! - the CDN that hosts uploaded page images (multipart upload with an
//!   unsigned preset), and
//! - the detection services that analyze a hosted image and return overlay
//!   image URLs, one endpoint per detection kind.
//!
//! The CDN upload is the only operation with automatic retry (bounded,
//! exponential backoff). Detection calls get a per-request deadline and are
//! never retried; a failure is reported to the caller and the layer stays
//! off.

use plandeck_core::limits::{
    DEFAULT_DETECT_TIMEOUT_SECS, UPLOAD_BACKOFF_BASE_MS, UPLOAD_MAX_ATTEMPTS,
};
use plandeck_core::{DetectionKind, LayerKind};
use serde::Deserialize;
use std::time::Duration;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Outbound service endpoints, read from the environment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// CDN upload endpoint (`PLANDECK_CDN_URL`).
    pub cdn_url: String,
    /// Unsigned upload preset name (`PLANDECK_CDN_PRESET`).
    pub cdn_preset: String,
    /// Detection service base URL (`PLANDECK_DETECT_URL`).
    pub detect_url: String,
    /// Per-call deadline for detection requests
    /// (`PLANDECK_DETECT_TIMEOUT_SECS`).
    pub detect_timeout: Duration,
}

impl ServiceConfig {
    /// Read the configuration from environment variables, defaulting to
    /// local development endpoints.
    #[must_use]
    pub fn from_env() -> Self {
        let detect_timeout_secs = std::env::var("PLANDECK_DETECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DETECT_TIMEOUT_SECS);

        Self {
            cdn_url: std::env::var("PLANDECK_CDN_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:9410/image/upload".to_string()),
            cdn_preset: std::env::var("PLANDECK_CDN_PRESET")
                .unwrap_or_else(|_| "plandeck-pages".to_string()),
            detect_url: std::env::var("PLANDECK_DETECT_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:9420".to_string()),
            detect_timeout: Duration::from_secs(detect_timeout_secs),
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Errors from the outbound service layer.
#[derive(Debug)]
pub enum ServiceError {
    /// Cannot reach the service at all.
    ConnectionFailed(String),
    /// The per-request deadline elapsed.
    Timeout(String),
    /// The service answered with a non-success status.
    Upstream(u16, String),
    /// The response body did not have the expected shape.
    InvalidResponse(String),
    /// The submitted image reference could not be turned into bytes.
    InvalidImage(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionFailed(url) => write!(f, "Cannot connect to {url}"),
            Self::Timeout(url) => write!(f, "Request to {url} timed out"),
            Self::Upstream(status, msg) => write!(f, "Upstream error ({status}): {msg}"),
            Self::InvalidResponse(msg) => write!(f, "Invalid response: {msg}"),
            Self::InvalidImage(msg) => write!(f, "Invalid image: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {}

// =============================================================================
// CDN CLIENT
// =============================================================================

#[derive(Debug, Deserialize)]
struct CdnUploadResponse {
    secure_url: String,
}

/// Client for the image CDN.
#[derive(Clone)]
pub struct CdnClient {
    http: reqwest::Client,
    upload_url: String,
    preset: String,
}

impl CdnClient {
    /// Create a client from the service configuration.
    #[must_use]
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            upload_url: config.cdn_url.clone(),
            preset: config.cdn_preset.clone(),
        }
    }

    /// Upload an image and return its hosted URL.
    ///
    /// `source` is either a `data:` URL (base64 payload, the rasterized
    /// page a client submitted) or a remote URL that is fetched first.
    ///
    /// Bounded retry: up to `UPLOAD_MAX_ATTEMPTS` attempts with exponential
    /// backoff. This is the only retry loop in the system.
    pub async fn upload_image(&self, source: &str) -> Result<String, ServiceError> {
        let bytes = self.image_bytes(source).await?;

        for attempt in 1..=UPLOAD_MAX_ATTEMPTS {
            match self.try_upload(bytes.clone()).await {
                Ok(url) => return Ok(url),
                Err(e) => {
                    if attempt == UPLOAD_MAX_ATTEMPTS {
                        return Err(e);
                    }
                    tracing::warn!(attempt, error = %e, "CDN upload failed, retrying");
                    let backoff = UPLOAD_BACKOFF_BASE_MS * 2u64.pow(attempt - 1);
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
            }
        }

        // The loop always returns on the final attempt.
        Err(ServiceError::ConnectionFailed(self.upload_url.clone()))
    }

    /// Turn an image reference into raw bytes.
    async fn image_bytes(&self, source: &str) -> Result<Vec<u8>, ServiceError> {
        if let Some(data) = source.strip_prefix("data:") {
            // data:<mime>;base64,<payload>
            let payload = data
                .split_once(',')
                .map(|(_, p)| p)
                .ok_or_else(|| ServiceError::InvalidImage("malformed data URL".to_string()))?;
            return base64::Engine::decode(&base64::engine::general_purpose::STANDARD, payload)
                .map_err(|e| ServiceError::InvalidImage(format!("base64 decode: {e}")));
        }

        let resp = self
            .http
            .get(source)
            .send()
            .await
            .map_err(|e| ServiceError::ConnectionFailed(format!("{source}: {e}")))?;
        if !resp.status().is_success() {
            return Err(ServiceError::Upstream(
                resp.status().as_u16(),
                format!("fetching {source}"),
            ));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// One upload attempt.
    async fn try_upload(&self, bytes: Vec<u8>) -> Result<String, ServiceError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("page.png")
            .mime_str("image/png")
            .map_err(|e| ServiceError::InvalidImage(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.preset.clone());

        let resp = self
            .http
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ServiceError::ConnectionFailed(format!("{}: {e}", self.upload_url)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ServiceError::Upstream(status.as_u16(), body));
        }

        let parsed: CdnUploadResponse = resp
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;
        if !parsed.secure_url.starts_with("http") {
            return Err(ServiceError::InvalidResponse(format!(
                "CDN returned a non-URL: {}",
                parsed.secure_url
            )));
        }
        Ok(parsed.secure_url)
    }
}

// =============================================================================
// DETECTION CLIENT
// =============================================================================

/// Response from the doors/windows service: one URL per combination layer.
#[derive(Debug, Deserialize)]
struct DoorsWindowsResponse {
    complete_doors_and_windows: String,
    single_doors: String,
    double_doors: String,
    windows: String,
    single_doors_and_windows: String,
    single_doors_and_double_doors: String,
    double_doors_and_windows: String,
}

/// The response field carrying the overlay URL for single-output kinds.
const fn link_field(kind: DetectionKind) -> &'static str {
    match kind {
        DetectionKind::WallColor => "wall_color_link",
        DetectionKind::RoomArea => "room_area_link",
        DetectionKind::RoomNumber => "room_n_link",
        DetectionKind::ExclusionZones => "exclusion_zones_link",
        DetectionKind::FireAlarm => "fire_alarm_link",
        // Doors/windows has its own typed response; this field is never read.
        DetectionKind::DoorsWindows => "complete_doors_and_windows",
    }
}

/// Client for the detection services.
#[derive(Clone)]
pub struct DetectionClient {
    http: reqwest::Client,
    base_url: String,
    deadline: Duration,
}

impl DetectionClient {
    /// Create a client from the service configuration.
    #[must_use]
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.detect_url.clone(),
            deadline: config.detect_timeout,
        }
    }

    /// Run one detection call and return the overlay URLs it produced.
    ///
    /// Request body is `{ "image_url": ... }`; one POST per kind under
    /// `/detect/<kind>`. The per-request deadline covers connect, send,
    /// and body read. No automatic retry.
    pub async fn detect(
        &self,
        kind: DetectionKind,
        image_url: &str,
    ) -> Result<Vec<(LayerKind, String)>, ServiceError> {
        let url = format!("{}/detect/{}", self.base_url, kind.as_str());
        let request = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "image_url": image_url }))
            .send();

        let resp = tokio::time::timeout(self.deadline, request)
            .await
            .map_err(|_| ServiceError::Timeout(url.clone()))?
            .map_err(|e| ServiceError::ConnectionFailed(format!("{url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ServiceError::Upstream(status.as_u16(), body));
        }

        let body: serde_json::Value = tokio::time::timeout(self.deadline, resp.json())
            .await
            .map_err(|_| ServiceError::Timeout(url.clone()))?
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        parse_outputs(kind, body)
    }
}

/// Map a detection response body to (layer, URL) pairs.
fn parse_outputs(
    kind: DetectionKind,
    body: serde_json::Value,
) -> Result<Vec<(LayerKind, String)>, ServiceError> {
    if kind == DetectionKind::DoorsWindows {
        let parsed: DoorsWindowsResponse = serde_json::from_value(body)
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;
        return Ok(vec![
            (
                LayerKind::CompleteDoorsAndWindows,
                parsed.complete_doors_and_windows,
            ),
            (LayerKind::SingleDoors, parsed.single_doors),
            (LayerKind::DoubleDoors, parsed.double_doors),
            (LayerKind::Windows, parsed.windows),
            (
                LayerKind::SingleDoorsAndWindows,
                parsed.single_doors_and_windows,
            ),
            (
                LayerKind::SingleDoorsAndDoubleDoors,
                parsed.single_doors_and_double_doors,
            ),
            (
                LayerKind::DoubleDoorsAndWindows,
                parsed.double_doors_and_windows,
            ),
        ]);
    }

    let field = link_field(kind);
    let link = body
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ServiceError::InvalidResponse(format!("missing field {field}")))?;
    Ok(vec![(kind.primary_layer(), link.to_string())])
}

// =============================================================================
// TESTS
// =============================================================================
