//! Storage subsystem
//!
//! This module provides the durable history of analysis records shared by
//! every view of the application.
//!
//! Components:
//! - `storage_trait`: the `RecordStore` and `Slot` traits.
//! - `types`: `HistoryRecord` and the types persisted with it.
//! - `record_store`: `PersistentRecordStore`, whole-collection read-modify-write over a slot.
//! - `file_storage`: JSON file slot with atomic replacement.
//! - `memory_storage`: in-process slot for tests and throwaway sessions.

pub mod file_storage;
pub mod memory_storage;
pub mod record_store;
pub mod storage_trait;
pub mod types;

pub use file_storage::FileSlot;
pub use memory_storage::MemorySlot;
pub use record_store::{FileRecordStore, PersistentRecordStore};
pub use storage_trait::{RecordStore, Slot};
pub use types::{AnalysisResult, HistoryRecord, RecordStatus, RecordUpdate};
