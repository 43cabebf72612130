//! # Canvas Document Model
//!
//! The per-project canvas document: an ordered list of pages, each carrying
//! its base image URL and a map of detection overlays.
//!
//! One page is one record. The overlay map is keyed by the closed
//! [`LayerKind`] enum, so there is no cross-array alignment to maintain:
//! an overlay either exists for a page or it does not.
//!
//! Mutation is additive. Overlays are written by detection completions and
//! never deleted; the whole document disappears only when its project is
//! deleted.

use crate::limits::{DOC_VERSION, MAX_PAGES_PER_PROJECT, MAX_URL_LENGTH};
use crate::types::{LayerKind, PlandeckError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// PAGE RECORD
// =============================================================================

/// One page of a canvas document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// URL of the base page image.
    pub base: String,
    /// Detection overlays produced for this page, keyed by layer kind.
    /// `LayerKind::Pages` never appears here.
    #[serde(default)]
    pub overlays: BTreeMap<LayerKind, String>,
}

impl PageRecord {
    /// Create a page with no overlays.
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            overlays: BTreeMap::new(),
        }
    }
}

// =============================================================================
// CANVAS DOCUMENT
// =============================================================================

/// The persisted canvas document for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasDoc {
    /// Document format version.
    pub version: String,
    /// Ordered page list.
    pub pages: Vec<PageRecord>,
}

impl Default for CanvasDoc {
    fn default() -> Self {
        Self {
            version: DOC_VERSION.to_string(),
            pages: Vec::new(),
        }
    }
}

impl CanvasDoc {
    /// Create a new empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages in the document.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Base image URL for a page, if the page exists.
    #[must_use]
    pub fn base_url(&self, page: usize) -> Option<&str> {
        self.pages.get(page).map(|p| p.base.as_str())
    }

    /// Overlay URL for a page and layer kind.
    ///
    /// Returns `None` for missing pages, missing overlays, and empty URLs;
    /// the resolver treats all three identically.
    #[must_use]
    pub fn overlay_url(&self, page: usize, kind: LayerKind) -> Option<&str> {
        self.pages
            .get(page)?
            .overlays
            .get(&kind)
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }

    /// Whether a non-empty overlay exists for the page and kind.
    #[must_use]
    pub fn has_overlay(&self, page: usize, kind: LayerKind) -> bool {
        self.overlay_url(page, kind).is_some()
    }

    /// URL for any layer kind at a page: the base image for
    /// [`LayerKind::Pages`], the overlay otherwise.
    #[must_use]
    pub fn layer_url(&self, page: usize, kind: LayerKind) -> Option<&str> {
        match kind {
            LayerKind::Pages => self.base_url(page).filter(|url| !url.is_empty()),
            other => self.overlay_url(page, other),
        }
    }

    /// Append pages to the document.
    ///
    /// Used by the chunked ingest path; each call appends one chunk's pages
    /// in order. Rejects empty/oversized URLs and documents growing past
    /// `MAX_PAGES_PER_PROJECT`.
    pub fn append_pages<I>(&mut self, urls: I) -> Result<(), PlandeckError>
    where
        I: IntoIterator<Item = String>,
    {
        for url in urls {
            if url.is_empty() {
                return Err(PlandeckError::InvalidInput(
                    "page URL must be non-empty".to_string(),
                ));
            }
            if url.len() > MAX_URL_LENGTH {
                return Err(PlandeckError::InvalidInput(format!(
                    "page URL length {} exceeds maximum {} bytes",
                    url.len(),
                    MAX_URL_LENGTH
                )));
            }
            if self.pages.len() >= MAX_PAGES_PER_PROJECT {
                return Err(PlandeckError::InvalidInput(format!(
                    "document already holds the maximum of {} pages",
                    MAX_PAGES_PER_PROJECT
                )));
            }
            self.pages.push(PageRecord::new(url));
        }
        Ok(())
    }

    /// Replace the base image URL of an existing page.
    ///
    /// Used after a CDN upload so the stored page points at the hosted copy
    /// instead of the client-submitted source.
    pub fn set_base(&mut self, page: usize, url: impl Into<String>) -> Result<(), PlandeckError> {
        let pages = self.pages.len();
        let record = self
            .pages
            .get_mut(page)
            .ok_or(PlandeckError::PageOutOfRange { page, pages })?;
        let url = url.into();
        if url.is_empty() || url.len() > MAX_URL_LENGTH {
            return Err(PlandeckError::InvalidInput(
                "base URL must be non-empty and within length limits".to_string(),
            ));
        }
        record.base = url;
        Ok(())
    }

    /// Record a detection overlay for a page.
    ///
    /// Additive: writing a kind that already exists replaces its URL (a
    /// re-run of the same detection), but overlays are never removed.
    /// `LayerKind::Pages` is not an overlay and is rejected.
    pub fn set_overlay(
        &mut self,
        page: usize,
        kind: LayerKind,
        url: impl Into<String>,
    ) -> Result<(), PlandeckError> {
        if kind == LayerKind::Pages {
            return Err(PlandeckError::InvalidInput(
                "pages is not an overlay kind".to_string(),
            ));
        }
        let pages = self.pages.len();
        let record = self
            .pages
            .get_mut(page)
            .ok_or(PlandeckError::PageOutOfRange { page, pages })?;
        let url = url.into();
        if url.len() > MAX_URL_LENGTH {
            return Err(PlandeckError::InvalidInput(format!(
                "overlay URL length {} exceeds maximum {} bytes",
                url.len(),
                MAX_URL_LENGTH
            )));
        }
        // Empty output from a detection service means "no overlay produced";
        // store nothing rather than an empty slot.
        if !url.is_empty() {
            record.overlays.insert(kind, url);
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_pages(n: usize) -> CanvasDoc {
        let mut doc = CanvasDoc::new();
        doc.append_pages((0..n).map(|i| format!("https://cdn.test/page-{i}.png")))
            .expect("append");
        doc
    }

    #[test]
    fn new_document_is_empty() {
        let doc = CanvasDoc::new();
        assert_eq!(doc.version, DOC_VERSION);
        assert_eq!(doc.page_count(), 0);
        assert_eq!(doc.base_url(0), None);
    }

    #[test]
    fn append_pages_keeps_order() {
        let doc = doc_with_pages(3);
        assert_eq!(doc.base_url(0), Some("https://cdn.test/page-0.png"));
        assert_eq!(doc.base_url(2), Some("https://cdn.test/page-2.png"));
    }

    #[test]
    fn append_rejects_empty_url() {
        let mut doc = CanvasDoc::new();
        assert!(doc.append_pages(vec![String::new()]).is_err());
    }

    #[test]
    fn set_overlay_then_read_back() {
        let mut doc = doc_with_pages(2);
        doc.set_overlay(1, LayerKind::WallColor, "https://cdn.test/walls-1.png")
            .expect("set");

        assert_eq!(
            doc.overlay_url(1, LayerKind::WallColor),
            Some("https://cdn.test/walls-1.png")
        );
        // Page 0 was not processed.
        assert_eq!(doc.overlay_url(0, LayerKind::WallColor), None);
    }

    #[test]
    fn set_overlay_out_of_range_is_error() {
        let mut doc = doc_with_pages(1);
        let err = doc
            .set_overlay(5, LayerKind::FireAlarm, "https://cdn.test/x.png")
            .expect_err("out of range");
        assert!(matches!(err, PlandeckError::PageOutOfRange { page: 5, .. }));
    }

    #[test]
    fn set_overlay_rejects_pages_kind() {
        let mut doc = doc_with_pages(1);
        assert!(doc
            .set_overlay(0, LayerKind::Pages, "https://cdn.test/x.png")
            .is_err());
    }

    #[test]
    fn empty_detection_output_stores_nothing() {
        let mut doc = doc_with_pages(1);
        doc.set_overlay(0, LayerKind::RoomArea, "").expect("set");
        assert!(!doc.has_overlay(0, LayerKind::RoomArea));
    }

    #[test]
    fn layer_url_pages_returns_base() {
        let doc = doc_with_pages(1);
        assert_eq!(
            doc.layer_url(0, LayerKind::Pages),
            Some("https://cdn.test/page-0.png")
        );
        assert_eq!(doc.layer_url(3, LayerKind::Pages), None);
    }

    #[test]
    fn set_base_replaces_url() {
        let mut doc = doc_with_pages(1);
        doc.set_base(0, "https://cdn.test/hosted.png").expect("set");
        assert_eq!(doc.base_url(0), Some("https://cdn.test/hosted.png"));
        assert!(doc.set_base(9, "https://cdn.test/x.png").is_err());
    }
}
