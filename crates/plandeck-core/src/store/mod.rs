//! # Record Storage
//!
//! Key-value storage for workspace records. Each record family (projects,
//! invoices, takeoffs, calendar events) is one table of id → postcard
//! bytes; the [`Workspace`] façade owns the typed encode/decode and the
//! backend dispatch.
//!
//! ## Storage Backends
//!
//! - `InMemory`: BTreeMap tables (fast, volatile; used by tests and the
//!   `--backend memory` CLI mode)
//! - `Persistent`: redb-backed ACID storage (see `redb_store`)
//!
//! Writes are full-record replace. There is no optimistic concurrency
//! check: concurrent editors are last-write-wins, which is the documented
//! contract for this system.

mod redb_store;

pub use redb_store::RedbStore;

use crate::records::{CalendarEventRecord, InvoiceRecord, ProjectRecord, TakeoffRecord};
use crate::types::PlandeckError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// =============================================================================
// RECORD FAMILIES
// =============================================================================

/// The four record families, each stored in its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Family {
    Projects,
    Invoices,
    Takeoffs,
    Calendar,
}

impl Family {
    /// All families, in table order.
    pub const ALL: [Family; 4] = [
        Family::Projects,
        Family::Invoices,
        Family::Takeoffs,
        Family::Calendar,
    ];
}

// =============================================================================
// RECORD STORE TRAIT
// =============================================================================

/// Raw byte-level storage operations, implemented by every backend.
///
/// Values are opaque to the backend; the [`Workspace`] layers typed
/// serialization on top. Keeping the trait untyped keeps backends small
/// and guarantees both store identical bytes.
pub trait RecordStore {
    /// Insert or replace a record.
    fn put(&mut self, family: Family, id: &str, bytes: &[u8]) -> Result<(), PlandeckError>;

    /// Fetch a record's bytes.
    fn get(&self, family: Family, id: &str) -> Result<Option<Vec<u8>>, PlandeckError>;

    /// Delete a record. Returns whether it existed.
    fn delete(&mut self, family: Family, id: &str) -> Result<bool, PlandeckError>;

    /// All records of a family in id order.
    fn scan(&self, family: Family) -> Result<Vec<(String, Vec<u8>)>, PlandeckError>;

    /// Number of records in a family.
    fn count(&self, family: Family) -> Result<usize, PlandeckError>;
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// Volatile store backed by BTreeMaps. Deterministic iteration order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: BTreeMap<Family, BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn put(&mut self, family: Family, id: &str, bytes: &[u8]) -> Result<(), PlandeckError> {
        self.tables
            .entry(family)
            .or_default()
            .insert(id.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, family: Family, id: &str) -> Result<Option<Vec<u8>>, PlandeckError> {
        Ok(self
            .tables
            .get(&family)
            .and_then(|table| table.get(id))
            .cloned())
    }

    fn delete(&mut self, family: Family, id: &str) -> Result<bool, PlandeckError> {
        Ok(self
            .tables
            .get_mut(&family)
            .is_some_and(|table| table.remove(id).is_some()))
    }

    fn scan(&self, family: Family) -> Result<Vec<(String, Vec<u8>)>, PlandeckError> {
        Ok(self
            .tables
            .get(&family)
            .map(|table| {
                table
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn count(&self, family: Family) -> Result<usize, PlandeckError> {
        Ok(self.tables.get(&family).map_or(0, BTreeMap::len))
    }
}

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Storage backend for a Workspace.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory tables (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed tables using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl StorageBackend {
    fn store(&self) -> &dyn RecordStore {
        match self {
            Self::InMemory(store) => store,
            Self::Persistent(store) => store,
        }
    }

    fn store_mut(&mut self) -> &mut dyn RecordStore {
        match self {
            Self::InMemory(store) => store,
            Self::Persistent(store) => store,
        }
    }
}

// =============================================================================
// RECORD COUNTS & SNAPSHOT
// =============================================================================

/// Record counts per family, for the status endpoint and CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
    pub projects: usize,
    pub invoices: usize,
    pub takeoffs: usize,
    pub calendar_events: usize,
}

/// A full dump of all records, for export/import.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub projects: Vec<ProjectRecord>,
    pub invoices: Vec<InvoiceRecord>,
    pub takeoffs: Vec<TakeoffRecord>,
    pub calendar_events: Vec<CalendarEventRecord>,
}

// =============================================================================
// WORKSPACE
// =============================================================================

/// The typed record store shared by the API and CLI.
#[derive(Debug, Default)]
pub struct Workspace {
    backend: StorageBackend,
}

impl Workspace {
    /// Create a workspace with in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a workspace with persistent redb storage at the given path.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, PlandeckError> {
        Ok(Self {
            backend: StorageBackend::Persistent(RedbStore::open(path)?),
        })
    }

    /// Create a workspace over an explicit backend.
    #[must_use]
    pub fn with_backend(backend: StorageBackend) -> Self {
        Self { backend }
    }

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, PlandeckError> {
        postcard::to_allocvec(value).map_err(|e| PlandeckError::SerializationError(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PlandeckError> {
        postcard::from_bytes(bytes).map_err(|e| PlandeckError::SerializationError(e.to_string()))
    }

    fn put_record<T: Serialize>(
        &mut self,
        family: Family,
        id: &str,
        record: &T,
    ) -> Result<(), PlandeckError> {
        let bytes = Self::encode(record)?;
        self.backend.store_mut().put(family, id, &bytes)
    }

    fn get_record<T: DeserializeOwned>(
        &self,
        family: Family,
        id: &str,
    ) -> Result<Option<T>, PlandeckError> {
        match self.backend.store().get(family, id)? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list_records<T: DeserializeOwned>(&self, family: Family) -> Result<Vec<T>, PlandeckError> {
        self.backend
            .store()
            .scan(family)?
            .iter()
            .map(|(_, bytes)| Self::decode(bytes))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Projects
    // -------------------------------------------------------------------------

    /// Insert or replace a project record.
    pub fn upsert_project(&mut self, record: &ProjectRecord) -> Result<(), PlandeckError> {
        self.put_record(Family::Projects, &record.id, record)
    }

    /// Fetch a project by id.
    pub fn project(&self, id: &str) -> Result<Option<ProjectRecord>, PlandeckError> {
        self.get_record(Family::Projects, id)
    }

    /// Fetch a project by id, erroring when absent.
    pub fn require_project(&self, id: &str) -> Result<ProjectRecord, PlandeckError> {
        self.project(id)?
            .ok_or_else(|| PlandeckError::NotFound(format!("project {id}")))
    }

    /// All projects in id order.
    pub fn projects(&self) -> Result<Vec<ProjectRecord>, PlandeckError> {
        self.list_records(Family::Projects)
    }

    /// Delete a project (and with it the canvas document). Returns whether
    /// it existed.
    pub fn remove_project(&mut self, id: &str) -> Result<bool, PlandeckError> {
        self.backend.store_mut().delete(Family::Projects, id)
    }

    // -------------------------------------------------------------------------
    // Invoices
    // -------------------------------------------------------------------------

    /// Insert or replace an invoice record.
    pub fn upsert_invoice(&mut self, record: &InvoiceRecord) -> Result<(), PlandeckError> {
        self.put_record(Family::Invoices, &record.id, record)
    }

    /// Fetch an invoice by id.
    pub fn invoice(&self, id: &str) -> Result<Option<InvoiceRecord>, PlandeckError> {
        self.get_record(Family::Invoices, id)
    }

    /// All invoices in id order.
    pub fn invoices(&self) -> Result<Vec<InvoiceRecord>, PlandeckError> {
        self.list_records(Family::Invoices)
    }

    /// Delete an invoice. Returns whether it existed.
    pub fn remove_invoice(&mut self, id: &str) -> Result<bool, PlandeckError> {
        self.backend.store_mut().delete(Family::Invoices, id)
    }

    // -------------------------------------------------------------------------
    // Takeoffs
    // -------------------------------------------------------------------------

    /// Insert or replace a takeoff record.
    pub fn upsert_takeoff(&mut self, record: &TakeoffRecord) -> Result<(), PlandeckError> {
        self.put_record(Family::Takeoffs, &record.id, record)
    }

    /// Fetch a takeoff by id.
    pub fn takeoff(&self, id: &str) -> Result<Option<TakeoffRecord>, PlandeckError> {
        self.get_record(Family::Takeoffs, id)
    }

    /// All takeoffs in id order.
    pub fn takeoffs(&self) -> Result<Vec<TakeoffRecord>, PlandeckError> {
        self.list_records(Family::Takeoffs)
    }

    /// Delete a takeoff. Returns whether it existed.
    pub fn remove_takeoff(&mut self, id: &str) -> Result<bool, PlandeckError> {
        self.backend.store_mut().delete(Family::Takeoffs, id)
    }

    // -------------------------------------------------------------------------
    // Calendar events
    // -------------------------------------------------------------------------

    /// Insert or replace a calendar event record.
    pub fn upsert_event(&mut self, record: &CalendarEventRecord) -> Result<(), PlandeckError> {
        self.put_record(Family::Calendar, &record.id, record)
    }

    /// Fetch a calendar event by id.
    pub fn event(&self, id: &str) -> Result<Option<CalendarEventRecord>, PlandeckError> {
        self.get_record(Family::Calendar, id)
    }

    /// All calendar events in id order.
    pub fn events(&self) -> Result<Vec<CalendarEventRecord>, PlandeckError> {
        self.list_records(Family::Calendar)
    }

    /// Delete a calendar event. Returns whether it existed.
    pub fn remove_event(&mut self, id: &str) -> Result<bool, PlandeckError> {
        self.backend.store_mut().delete(Family::Calendar, id)
    }

    // -------------------------------------------------------------------------
    // Workspace-wide operations
    // -------------------------------------------------------------------------

    /// Record counts for every family.
    pub fn counts(&self) -> Result<StoreCounts, PlandeckError> {
        let store = self.backend.store();
        Ok(StoreCounts {
            projects: store.count(Family::Projects)?,
            invoices: store.count(Family::Invoices)?,
            takeoffs: store.count(Family::Takeoffs)?,
            calendar_events: store.count(Family::Calendar)?,
        })
    }

    /// Dump all records.
    pub fn snapshot(&self) -> Result<Snapshot, PlandeckError> {
        Ok(Snapshot {
            projects: self.projects()?,
            invoices: self.invoices()?,
            takeoffs: self.takeoffs()?,
            calendar_events: self.events()?,
        })
    }

    /// Upsert every record of a snapshot into this workspace.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), PlandeckError> {
        for record in &snapshot.projects {
            self.upsert_project(record)?;
        }
        for record in &snapshot.invoices {
            self.upsert_invoice(record)?;
        }
        for record in &snapshot.takeoffs {
            self.upsert_takeoff(record)?;
        }
        for record in &snapshot.calendar_events {
            self.upsert_event(record)?;
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
    use crate::canvas::CanvasDoc;
    use chrono::{TimeZone, Utc};

    fn sample_project(id: &str) -> ProjectRecord {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("ts");
        ProjectRecord {
            id: id.to_string(),
            name: "Office tower".to_string(),
            owner: "default".to_string(),
            created_at: ts,
            updated_at: ts,
            canvas: CanvasDoc::new(),
        }
    }

    #[test]
    fn memory_store_round_trip() {
        let mut ws = Workspace::new();
        let project = sample_project("p1");
        ws.upsert_project(&project).expect("upsert");

        let loaded = ws.project("p1").expect("get").expect("present");
        assert_eq!(loaded, project);
        assert_eq!(ws.counts().expect("counts").projects, 1);

        assert!(ws.remove_project("p1").expect("remove"));
        assert!(!ws.remove_project("p1").expect("remove again"));
        assert!(ws.project("p1").expect("get").is_none());
    }

    #[test]
    fn require_project_reports_not_found() {
        let ws = Workspace::new();
        let err = ws.require_project("missing").expect_err("absent");
        assert!(matches!(err, PlandeckError::NotFound(_)));
    }

    #[test]
    fn scan_is_id_ordered() {
        let mut ws = Workspace::new();
        for id in ["b", "a", "c"] {
            ws.upsert_project(&sample_project(id)).expect("upsert");
        }
        let ids: Vec<String> = ws
            .projects()
            .expect("list")
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn snapshot_restore_round_trip() {
        let mut ws = Workspace::new();
        ws.upsert_project(&sample_project("p1")).expect("upsert");
        let snapshot = ws.snapshot().expect("snapshot");

        let mut other = Workspace::new();
        other.restore(&snapshot).expect("restore");
        assert_eq!(other.counts().expect("counts").projects, 1);
    }
}
