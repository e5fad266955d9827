//! Write-behind persistence for legal records.
//!
//! In-memory state always leads durable state. Mutations mark records
//! dirty in a [`DirtyTracker`]; a slow-cadence flush serializes the dirty
//! set through an [`EntityStore`]. Losing a flush loses at most one
//! cadence window of legal bookkeeping, which the simulation tolerates.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Errors from the durable store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected or failed the write.
    #[error("store write failed for {kind}/{id}: {reason}")]
    WriteFailed {
        /// Entity kind tag.
        kind: String,
        /// Record id.
        id: Uuid,
        /// Backend-reported reason.
        reason: String,
    },
}

/// Durable upsert/delete of serialized records by kind and id.
pub trait EntityStore {
    /// Insert or replace a record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WriteFailed`] when the backend rejects the
    /// write.
    fn upsert(&mut self, kind: &str, id: Uuid, body: serde_json::Value) -> Result<(), StoreError>;

    /// Delete a record. Deleting a missing record is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WriteFailed`] when the backend rejects the
    /// delete.
    fn delete(&mut self, kind: &str, id: Uuid) -> Result<(), StoreError>;
}

/// A dirty-record key: entity kind tag plus record id.
pub type DirtyKey = (String, Uuid);

/// Batches dirty record ids between flushes.
#[derive(Debug, Default)]
pub struct DirtyTracker {
    dirty: BTreeSet<DirtyKey>,
}

impl DirtyTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a record dirty. Marking twice before a flush is one write.
    pub fn mark(&mut self, kind: &str, id: Uuid) {
        self.dirty.insert((kind.to_owned(), id));
    }

    /// Number of records awaiting flush.
    pub fn pending(&self) -> usize {
        self.dirty.len()
    }

    /// Take the whole dirty set, leaving the tracker empty.
    pub fn drain(&mut self) -> BTreeSet<DirtyKey> {
        let drained = std::mem::take(&mut self.dirty);
        if !drained.is_empty() {
            debug!(records = drained.len(), "Draining dirty set for flush");
        }
        drained
    }
}

/// In-memory [`EntityStore`] for tests and the standalone engine.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: std::collections::BTreeMap<DirtyKey, serde_json::Value>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a stored record back.
    pub fn get(&self, kind: &str, id: Uuid) -> Option<&serde_json::Value> {
        self.records.get(&(kind.to_owned(), id))
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl EntityStore for MemoryStore {
    fn upsert(&mut self, kind: &str, id: Uuid, body: serde_json::Value) -> Result<(), StoreError> {
        self.records.insert((kind.to_owned(), id), body);
        Ok(())
    }

    fn delete(&mut self, kind: &str, id: Uuid) -> Result<(), StoreError> {
        self.records.remove(&(kind.to_owned(), id));
        Ok(())
    }
}
