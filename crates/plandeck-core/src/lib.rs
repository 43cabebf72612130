//! # plandeck-core
//!
//! The deterministic canvas/record engine for Plandeck - THE LOGIC.
//!
//! This crate implements the core substrate of the project dashboard: the
//! per-project canvas document, the layer resolver, the viewer toggle state
//! machine, and the record store backing them.
//!
//! ## Architectural Constraints
//!
//! The core:
//! - Is the ONLY place where record state lives (stateful)
//! - Is closed: no external logic may be injected
//! - Never performs I/O beyond its own storage backend
//! - Has NO async, NO network dependencies, and never reads a clock
//!   (timestamps are minted by the app layer and stored opaquely)

// =============================================================================
// MODULES
// =============================================================================

pub mod canvas;
pub mod limits;
pub mod records;
pub mod resolver;
pub mod store;
pub mod types;
pub mod viewer;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    DetectionKind, DoorToggle, DoorWindowToggles, LayerFlags, LayerKind, PlandeckError,
};

// =============================================================================
// RE-EXPORTS: Canvas Engine
// =============================================================================

pub use canvas::{CanvasDoc, PageRecord};
pub use resolver::{resolve, resolve_url};
pub use viewer::{Completion, Enable, LayerPhase, ViewerState};

// =============================================================================
// RE-EXPORTS: Records & Storage
// =============================================================================

pub use records::{
    CalendarEventRecord, DocumentStatus, InvoiceRecord, ProjectRecord, TakeoffRecord,
};
pub use store::{
    Family, MemoryStore, RecordStore, RedbStore, Snapshot, StorageBackend, StoreCounts, Workspace,
};
