//! # redb-backed Record Storage
//!
//! A disk-backed record store using the redb embedded database, providing:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//! - Zero configuration
//!
//! Each record family gets one table of id string → postcard bytes. The
//! bytes are produced by the `Workspace` layer; this module never looks
//! inside them.

use super::{Family, RecordStore};
use crate::types::PlandeckError;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;

/// Table for projects: id -> serialized ProjectRecord bytes
const PROJECTS: TableDefinition<&str, &[u8]> = TableDefinition::new("projects");

/// Table for invoices: id -> serialized InvoiceRecord bytes
const INVOICES: TableDefinition<&str, &[u8]> = TableDefinition::new("invoices");

/// Table for takeoffs: id -> serialized TakeoffRecord bytes
const TAKEOFFS: TableDefinition<&str, &[u8]> = TableDefinition::new("takeoffs");

/// Table for calendar events: id -> serialized CalendarEventRecord bytes
const CALENDAR: TableDefinition<&str, &[u8]> = TableDefinition::new("calendar_events");

const fn table_for(family: Family) -> TableDefinition<'static, &'static str, &'static [u8]> {
    match family {
        Family::Projects => PROJECTS,
        Family::Invoices => INVOICES,
        Family::Takeoffs => TAKEOFFS,
        Family::Calendar => CALENDAR,
    }
}

/// A disk-backed record store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a record database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PlandeckError> {
        let db =
            Database::create(path.as_ref()).map_err(|e| PlandeckError::IoError(e.to_string()))?;

        // Initialize tables if they don't exist
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| PlandeckError::IoError(e.to_string()))?;
            for family in Family::ALL {
                let _ = write_txn
                    .open_table(table_for(family))
                    .map_err(|e| PlandeckError::IoError(e.to_string()))?;
            }
            write_txn
                .commit()
                .map_err(|e| PlandeckError::IoError(e.to_string()))?;
        }

        Ok(Self { db })
    }

    /// Compact the database (optional optimization).
    pub fn compact(&mut self) -> Result<(), PlandeckError> {
        self.db
            .compact()
            .map_err(|e| PlandeckError::IoError(e.to_string()))?;
        Ok(())
    }
}

impl RecordStore for RedbStore {
    fn put(&mut self, family: Family, id: &str, bytes: &[u8]) -> Result<(), PlandeckError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| PlandeckError::IoError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(table_for(family))
                .map_err(|e| PlandeckError::IoError(e.to_string()))?;
            table
                .insert(id, bytes)
                .map_err(|e| PlandeckError::IoError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| PlandeckError::IoError(e.to_string()))
    }

    fn get(&self, family: Family, id: &str) -> Result<Option<Vec<u8>>, PlandeckError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| PlandeckError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(table_for(family))
            .map_err(|e| PlandeckError::IoError(e.to_string()))?;
        let value = table
            .get(id)
            .map_err(|e| PlandeckError::IoError(e.to_string()))?
            .map(|guard| guard.value().to_vec());
        Ok(value)
    }

    fn delete(&mut self, family: Family, id: &str) -> Result<bool, PlandeckError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| PlandeckError::IoError(e.to_string()))?;
        let existed;
        {
            let mut table = write_txn
                .open_table(table_for(family))
                .map_err(|e| PlandeckError::IoError(e.to_string()))?;
            existed = table
                .remove(id)
                .map_err(|e| PlandeckError::IoError(e.to_string()))?
                .is_some();
        }
        write_txn
            .commit()
            .map_err(|e| PlandeckError::IoError(e.to_string()))?;
        Ok(existed)
    }

    fn scan(&self, family: Family) -> Result<Vec<(String, Vec<u8>)>, PlandeckError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| PlandeckError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(table_for(family))
            .map_err(|e| PlandeckError::IoError(e.to_string()))?;

        let mut records = Vec::new();
        for entry in table
            .iter()
            .map_err(|e| PlandeckError::IoError(e.to_string()))?
        {
            let (key, value) = entry.map_err(|e| PlandeckError::IoError(e.to_string()))?;
            records.push((key.value().to_string(), value.value().to_vec()));
        }
        Ok(records)
    }

    fn count(&self, family: Family) -> Result<usize, PlandeckError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| PlandeckError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(table_for(family))
            .map_err(|e| PlandeckError::IoError(e.to_string()))?;
        let len = table
            .len()
            .map_err(|e| PlandeckError::IoError(e.to_string()))?;
        Ok(len as usize)
    }
}
