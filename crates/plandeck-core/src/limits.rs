//! # Operational Limits
//!
//! Hardcoded runtime constants for the Plandeck core.
//!
//! These limits are compiled into the binary and are immutable at runtime.
//! They bound every externally-supplied quantity so that no request can
//! exhaust memory or queue unbounded work.

/// Canvas document format version written into new documents.
pub const DOC_VERSION: &str = "1.0";

/// Maximum length for project, invoice, and event name/title strings.
///
/// Longer names are rejected at the API boundary before reaching storage.
pub const MAX_NAME_LENGTH: usize = 256;

/// Maximum length for a stored image URL.
///
/// Overlay and base URLs beyond this are rejected; this keeps individual
/// records bounded even when clients submit data URLs by mistake.
pub const MAX_URL_LENGTH: usize = 8192;

/// Maximum number of pages a single project document may hold.
pub const MAX_PAGES_PER_PROJECT: usize = 500;

/// Maximum number of pages accepted in one ingest chunk.
///
/// Large uploads are split client-side; each chunk must stay small enough
/// to process within one request.
pub const MAX_PAGES_PER_CHUNK: usize = 50;

/// Maximum length for client email fields.
pub const MAX_EMAIL_LENGTH: usize = 320;

/// Maximum attempts for the CDN upload helper.
///
/// This is the only retry loop in the system; detection calls are never
/// retried automatically.
pub const UPLOAD_MAX_ATTEMPTS: u32 = 3;

/// Base delay for the upload helper's exponential backoff, in milliseconds.
///
/// Attempt n sleeps `UPLOAD_BACKOFF_BASE_MS * 2^(n-1)` before retrying.
pub const UPLOAD_BACKOFF_BASE_MS: u64 = 1000;

/// Default deadline for one detection call, in seconds.
///
/// Overridable via `PLANDECK_DETECT_TIMEOUT_SECS` in the app layer.
pub const DEFAULT_DETECT_TIMEOUT_SECS: u64 = 120;

/// Upper bound for viewer long-poll waits, in milliseconds.
pub const MAX_WAIT_MS: u64 = 30_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_retries_are_bounded() {
        // The upload helper is contractually bounded at 3 attempts.
        assert_eq!(UPLOAD_MAX_ATTEMPTS, 3);
    }

    #[test]
    fn chunk_fits_in_project() {
        assert!(MAX_PAGES_PER_CHUNK <= MAX_PAGES_PER_PROJECT);
    }
}
