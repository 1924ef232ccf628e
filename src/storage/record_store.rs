use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::error_handling::types::StorageError;
use crate::storage::file_storage::FileSlot;
use crate::storage::storage_trait::{RecordStore, Slot};
use crate::storage::types::{HistoryRecord, RecordUpdate};
use crate::sync::SyncBus;

/// History store backed by a JSON file.
pub type FileRecordStore = PersistentRecordStore<FileSlot>;

/// `RecordStore` that keeps the whole collection in one [`Slot`].
///
/// Every mutation re-reads the slot, changes the collection in memory,
/// writes it back whole and then publishes once on the bus. Mutations from
/// this process are serialized; between processes the last write wins.
pub struct PersistentRecordStore<S: Slot> {
    slot: S,
    bus: Arc<SyncBus>,
    write_lock: Mutex<()>,
}

impl<S: Slot> PersistentRecordStore<S> {
    pub fn new(slot: S, bus: Arc<SyncBus>) -> Self {
        debug!("Record store opened on {}", slot.describe());
        Self {
            slot,
            bus,
            write_lock: Mutex::new(()),
        }
    }

    pub fn bus(&self) -> &Arc<SyncBus> {
        &self.bus
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// A corrupted slot reads as empty; only I/O failures are errors.
    fn read_records(&self) -> Result<Vec<HistoryRecord>, StorageError> {
        let Some(raw) = self.slot.read()? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<HistoryRecord>>(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!(
                    "Ignoring unreadable history in {}: {}",
                    self.slot.describe(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    fn mutate<T>(
        &self,
        operation: &str,
        change: impl FnOnce(&mut Vec<HistoryRecord>) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let outcome = {
            let _guard = self
                .write_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let mut records = self.read_records()?;
            let outcome = change(&mut records)?;
            let raw = serde_json::to_string(&records).map_err(|e| {
                error!("Failed to serialize history: {}", e);
                StorageError::WriteFailed(e.to_string())
            })?;
            self.slot.write(&raw)?;
            debug!("{}: persisted {} record(s)", operation, records.len());
            outcome
        };
        // Published outside the lock so subscribers can call `load`.
        self.bus.publish();
        Ok(outcome)
    }
}

impl<S: Slot> RecordStore for PersistentRecordStore<S> {
    fn load(&self) -> Vec<HistoryRecord> {
        self.read_records().unwrap_or_else(|e| {
            error!("Failed to load history from {}: {}", self.slot.describe(), e);
            Vec::new()
        })
    }

    fn add(&self, record: HistoryRecord) -> Result<(), StorageError> {
        let id = record.id;
        self.mutate("add", |records| {
            if records.iter().any(|existing| existing.id == id) {
                return Err(StorageError::DuplicateId(id));
            }
            records.insert(0, record);
            Ok(())
        })?;
        info!("Added record {} to history", id);
        Ok(())
    }

    fn update_by_id(&self, id: Uuid, update: RecordUpdate) -> Result<HistoryRecord, StorageError> {
        self.mutate("update", |records| {
            let record = records
                .iter_mut()
                .find(|record| record.id == id)
                .ok_or(StorageError::NotFound(id))?;
            update.apply_to(record);
            Ok(record.clone())
        })
    }

    fn remove_by_id(&self, id: Uuid) -> Result<bool, StorageError> {
        let removed = self.mutate("remove", |records| {
            let before = records.len();
            records.retain(|record| record.id != id);
            Ok(records.len() != before)
        })?;
        if removed {
            info!("Removed record {} from history", id);
        }
        Ok(removed)
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.mutate("clear", |records| {
            records.clear();
            Ok(())
        })?;
        info!("Cleared history");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use crate::storage::memory_storage::MemorySlot;
    use crate::storage::types::{AnalysisResult, RecordStatus};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn record(n: u128) -> HistoryRecord {
        HistoryRecord::pending(
            Uuid::from_u128(n),
            format!("file-{n}.png"),
            100 * n as u64,
            Utc::now(),
            Some(encode(&[n as u8; 4], "image/png")),
        )
    }

    fn memory_store() -> PersistentRecordStore<MemorySlot> {
        PersistentRecordStore::new(MemorySlot::new(), Arc::new(SyncBus::default()))
    }

    fn counting(bus: &Arc<SyncBus>) -> (Arc<AtomicUsize>, crate::sync::Subscription) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let sub = bus.subscribe(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (count, sub)
    }

    #[test]
    fn empty_slot_loads_empty() {
        assert!(memory_store().load().is_empty());
    }

    #[test]
    fn add_inserts_most_recent_first() {
        let store = memory_store();
        store.add(record(1)).unwrap();
        store.add(record(2)).unwrap();
        let ids: Vec<_> = store.load().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![Uuid::from_u128(2), Uuid::from_u128(1)]);
    }

    #[test]
    fn add_grows_by_one_with_new_head() {
        let store = memory_store();
        store.add(record(1)).unwrap();
        let before = store.load().len();
        let newest = record(9);
        store.add(newest.clone()).unwrap();
        let after = store.load();
        assert_eq!(after.len(), before + 1);
        assert_eq!(after[0], newest);
    }

    #[test]
    fn duplicate_id_is_rejected_without_writing() {
        let store = memory_store();
        let (count, _sub) = counting(store.bus());
        store.add(record(1)).unwrap();
        let err = store.add(record(1)).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateId(id) if id == Uuid::from_u128(1)));
        assert_eq!(store.load().len(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn update_applies_partial_fields() {
        let store = memory_store();
        store.add(record(1)).unwrap();
        let original = store.load().remove(0);
        let result = AnalysisResult::Success {
            payload_class: 2,
            quality_score: 0.5,
        };
        let updated = store
            .update_by_id(original.id, RecordUpdate::resolved(result.clone()))
            .unwrap();
        assert_eq!(updated.status, RecordStatus::Analyzed);
        assert_eq!(updated.result, Some(result));
        assert_eq!(updated.preview_encoding, original.preview_encoding);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(store.load(), vec![updated]);
    }

    #[test]
    fn update_of_unknown_id_is_not_found() {
        let store = memory_store();
        let err = store
            .update_by_id(Uuid::from_u128(5), RecordUpdate::default())
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn remove_of_absent_id_leaves_collection_unchanged() {
        let store = memory_store();
        store.add(record(1)).unwrap();
        let before = store.load();
        assert!(!store.remove_by_id(Uuid::from_u128(42)).unwrap());
        assert_eq!(store.load(), before);
        assert!(store.remove_by_id(Uuid::from_u128(1)).unwrap());
        assert!(store.load().is_empty());
    }

    #[test]
    fn clear_empties_any_contents() {
        let store = memory_store();
        for n in 1..=3 {
            store.add(record(n)).unwrap();
        }
        store.clear().unwrap();
        assert!(store.load().is_empty());
        assert_eq!(store.slot().contents().as_deref(), Some("[]"));
    }

    #[test]
    fn every_mutation_notifies_each_subscriber_once() {
        let store = memory_store();
        let (first, _a) = counting(store.bus());
        let (second, _b) = counting(store.bus());

        store.add(record(1)).unwrap();
        store
            .update_by_id(Uuid::from_u128(1), RecordUpdate::default())
            .unwrap();
        store.remove_by_id(Uuid::from_u128(99)).unwrap();
        store.remove_by_id(Uuid::from_u128(1)).unwrap();
        store.clear().unwrap();

        assert_eq!(first.load(Ordering::SeqCst), 5);
        assert_eq!(second.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn corrupted_slot_fails_closed() {
        let store = PersistentRecordStore::new(
            MemorySlot::with_contents("{not json"),
            Arc::new(SyncBus::default()),
        );
        assert!(store.load().is_empty());
        // the next write replaces the corrupted contents
        store.add(record(1)).unwrap();
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let bus = Arc::new(SyncBus::default());
        {
            let store = FileRecordStore::new(FileSlot::new(dir.path()).unwrap(), bus.clone());
            store.add(record(1)).unwrap();
            store.add(record(2)).unwrap();
        }
        let reopened = FileRecordStore::new(FileSlot::new(dir.path()).unwrap(), bus);
        let ids: Vec<_> = reopened.load().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![Uuid::from_u128(2), Uuid::from_u128(1)]);
    }

    #[test]
    fn non_json_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let slot = FileSlot::new(dir.path()).unwrap();
        std::fs::write(slot.path(), "definitely not json").unwrap();
        let store = FileRecordStore::new(slot, Arc::new(SyncBus::default()));
        assert!(store.load().is_empty());
    }

    #[test]
    fn stores_sharing_a_slot_see_the_last_write() {
        let slot = Arc::new(MemorySlot::new());
        let tab_a = PersistentRecordStore::new(slot.clone(), Arc::new(SyncBus::default()));
        let tab_b = PersistentRecordStore::new(slot, Arc::new(SyncBus::default()));

        tab_a.add(record(1)).unwrap();
        tab_b.add(record(2)).unwrap();
        assert_eq!(tab_a.load().len(), 2);

        tab_b.clear().unwrap();
        assert!(tab_a.load().is_empty());
    }
}
