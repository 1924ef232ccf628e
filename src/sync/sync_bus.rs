use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use log::{debug, trace};

/// Name of the channel the history store publishes on.
pub const HISTORY_UPDATE_EVENT: &str = "fileHistoryUpdate";

type Handler = Arc<dyn Fn() + Send + Sync>;

/// In-process "something changed" channel.
///
/// Notifications carry no payload; subscribers are expected to re-read the
/// store. Handlers run synchronously on the publishing thread, in no
/// particular order, and each registered handler runs once per publish.
pub struct SyncBus {
    name: String,
    next_id: AtomicU64,
    handlers: Mutex<Vec<(u64, Handler)>>,
}

impl SyncBus {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            next_id: AtomicU64::new(0),
            handlers: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers `handler` until the returned [`Subscription`] is dropped or
    /// explicitly unsubscribed.
    pub fn subscribe<F>(self: &Arc<Self>, handler: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock_handlers().push((id, Arc::new(handler)));
        debug!("[{}] subscriber {} registered", self.name, id);
        Subscription {
            id,
            bus: Arc::downgrade(self),
            active: true,
        }
    }

    pub fn publish(&self) {
        // Snapshot first: a handler may subscribe or unsubscribe while running.
        let handlers: Vec<Handler> = self
            .lock_handlers()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        trace!("[{}] notifying {} subscriber(s)", self.name, handlers.len());
        for handler in handlers {
            handler();
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock_handlers().len()
    }

    fn unsubscribe(&self, id: u64) {
        self.lock_handlers().retain(|(existing, _)| *existing != id);
        debug!("[{}] subscriber {} removed", self.name, id);
    }

    fn lock_handlers(&self) -> std::sync::MutexGuard<'_, Vec<(u64, Handler)>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SyncBus {
    fn default() -> Self {
        Self::new(HISTORY_UPDATE_EVENT)
    }
}

/// Disposer returned by [`SyncBus::subscribe`].
#[must_use = "dropping a Subscription unsubscribes its handler"]
pub struct Subscription {
    id: u64,
    bus: Weak<SyncBus>,
    active: bool,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter(bus: &Arc<SyncBus>) -> (Arc<AtomicUsize>, Subscription) {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        let sub = bus.subscribe(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (hits, sub)
    }

    #[test]
    fn every_subscriber_sees_each_publish_once() {
        let bus = Arc::new(SyncBus::default());
        let (a, _sa) = counter(&bus);
        let (b, _sb) = counter(&bus);
        bus.publish();
        bus.publish();
        assert_eq!(a.load(Ordering::SeqCst), 2);
        assert_eq!(b.load(Ordering::SeqCst), 2);
        assert_eq!(bus.name(), "fileHistoryUpdate");
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = Arc::new(SyncBus::default());
        let (a, sa) = counter(&bus);
        let (b, _sb) = counter(&bus);
        bus.publish();
        sa.unsubscribe();
        bus.publish();
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 2);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let bus = Arc::new(SyncBus::default());
        {
            let (_hits, _sub) = counter(&bus);
            assert_eq!(bus.subscriber_count(), 1);
        }
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn subscription_outliving_bus_is_harmless() {
        let bus = Arc::new(SyncBus::default());
        let (_hits, sub) = counter(&bus);
        drop(bus);
        sub.unsubscribe();
    }

    #[test]
    fn handler_may_unsubscribe_during_publish() {
        let bus = Arc::new(SyncBus::default());
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let hits = Arc::new(AtomicUsize::new(0));
        let (slot_in, hits_in) = (Arc::clone(&slot), Arc::clone(&hits));
        let sub = bus.subscribe(move || {
            hits_in.fetch_add(1, Ordering::SeqCst);
            slot_in.lock().unwrap().take();
        });
        *slot.lock().unwrap() = Some(sub);
        bus.publish();
        bus.publish();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
