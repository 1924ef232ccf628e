use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;

use super::sync_bus::{Subscription, SyncBus};
use crate::storage::{HistoryRecord, RecordStore};

/// A mounted history list.
///
/// Holds its own copy of the collection, read at mount time and re-read
/// from the store each time the bus announces a change. Dropping the view
/// unmounts it.
pub struct HistoryView {
    records: Arc<Mutex<Vec<HistoryRecord>>>,
    refreshes: Arc<AtomicUsize>,
    _subscription: Subscription,
}

impl HistoryView {
    pub fn mount(store: Arc<dyn RecordStore>, bus: &Arc<SyncBus>) -> Self {
        let records = Arc::new(Mutex::new(store.load()));
        let refreshes = Arc::new(AtomicUsize::new(0));

        let target = Arc::clone(&records);
        let counter = Arc::clone(&refreshes);
        let subscription = bus.subscribe(move || {
            let fresh = store.load();
            debug!("History view refreshed with {} record(s)", fresh.len());
            *target.lock().unwrap_or_else(PoisonError::into_inner) = fresh;
            counter.fetch_add(1, Ordering::SeqCst);
        });

        Self {
            records,
            refreshes,
            _subscription: subscription,
        }
    }

    pub fn records(&self) -> Vec<HistoryRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of times the view re-read the store since mounting.
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn unmount(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemorySlot, PersistentRecordStore, RecordUpdate};
    use chrono::Utc;
    use uuid::Uuid;

    fn setup() -> (Arc<SyncBus>, Arc<dyn RecordStore>) {
        let bus = Arc::new(SyncBus::default());
        let store: Arc<dyn RecordStore> =
            Arc::new(PersistentRecordStore::new(MemorySlot::new(), bus.clone()));
        (bus, store)
    }

    fn record(n: u128) -> HistoryRecord {
        HistoryRecord::pending(Uuid::from_u128(n), format!("{n}.txt"), n as u64, Utc::now(), None)
    }

    #[test]
    fn views_follow_mutations_made_elsewhere() {
        let (bus, store) = setup();
        store.add(record(1)).unwrap();

        let side_panel = HistoryView::mount(store.clone(), &bus);
        let analyze_page = HistoryView::mount(store.clone(), &bus);
        assert_eq!(side_panel.len(), 1);

        store.add(record(2)).unwrap();
        assert_eq!(side_panel.records(), store.load());
        assert_eq!(analyze_page.records(), store.load());

        store
            .update_by_id(Uuid::from_u128(1), RecordUpdate::default())
            .unwrap();
        store.remove_by_id(Uuid::from_u128(2)).unwrap();
        assert_eq!(side_panel.len(), 1);
        assert_eq!(side_panel.refresh_count(), 3);
        assert_eq!(analyze_page.refresh_count(), 3);
    }

    #[test]
    fn unmounted_view_stops_listening() {
        let (bus, store) = setup();
        let view = HistoryView::mount(store.clone(), &bus);
        assert_eq!(bus.subscriber_count(), 1);
        view.unmount();
        assert_eq!(bus.subscriber_count(), 0);
        store.clear().unwrap();
    }
}
