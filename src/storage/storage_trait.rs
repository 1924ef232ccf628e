//! Storage Traits
//!
//! `RecordStore` is the interface views and the workflow use to read and
//! change the history. `Slot` is the durable cell a store persists into: one
//! named value holding the entire serialized collection.
//!
//! All methods are synchronous; a call that returns `Ok` has already been
//! persisted and announced on the store's sync bus.

use std::sync::Arc;

use uuid::Uuid;

use crate::error_handling::types::StorageError;
use crate::storage::types::{HistoryRecord, RecordUpdate};

/// Ordered, durable collection of history records, most recent first.
pub trait RecordStore: Send + Sync {
    /// Reads the durable collection.
    ///
    /// A missing slot yields an empty list; so does an unreadable or
    /// corrupted one, after logging the anomaly.
    fn load(&self) -> Vec<HistoryRecord>;

    /// Inserts `record` at the front.
    ///
    /// Fails with [`StorageError::DuplicateId`] when the id is already stored.
    fn add(&self, record: HistoryRecord) -> Result<(), StorageError>;

    /// Applies `update` to the record with `id` and returns the stored result.
    ///
    /// Fails with [`StorageError::NotFound`] when no such record exists.
    fn update_by_id(&self, id: Uuid, update: RecordUpdate) -> Result<HistoryRecord, StorageError>;

    /// Removes the record with `id`. Returns whether a record was removed;
    /// an absent id leaves the collection unchanged and is not an error.
    fn remove_by_id(&self, id: Uuid) -> Result<bool, StorageError>;

    /// Removes every record.
    fn clear(&self) -> Result<(), StorageError>;

    fn get(&self, id: Uuid) -> Option<HistoryRecord> {
        self.load().into_iter().find(|record| record.id == id)
    }
}

/// A single named durable value.
pub trait Slot: Send + Sync {
    /// Current contents, `None` when nothing was ever written.
    fn read(&self) -> Result<Option<String>, StorageError>;

    /// Replaces the contents as one atomic step.
    fn write(&self, contents: &str) -> Result<(), StorageError>;

    /// Human readable location, for logs.
    fn describe(&self) -> String;
}

impl<S: Slot + ?Sized> Slot for Arc<S> {
    fn read(&self) -> Result<Option<String>, StorageError> {
        (**self).read()
    }

    fn write(&self, contents: &str) -> Result<(), StorageError> {
        (**self).write(contents)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
