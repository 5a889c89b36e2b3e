//! Cache and registry, updated together.
//!
//! Every successful cache write is followed by a notification of that entry's
//! subscribers. The hub collects the callbacks while still holding the cache
//! lock, so a subscriber either sees the write through its initial snapshot or
//! through the notification, never neither. Callbacks run after the cache and
//! registry locks are released and may call back into the session.
//!
//! Writes and their deliveries are serialized by a reentrant gate held from
//! the cache write until the last callback returns, so writers on different
//! threads cannot interleave their notifications. A callback that writes the
//! same entry supersedes the snapshot being delivered: the rest of the round
//! is skipped, since the nested write already reached every subscriber.
//!
//! Lock order is always gate, then cache, then registry.

use crate::cache::SnapshotCache;
use crate::metrics::Counters;
use crate::registry::{deliver, DeliveryReport, SubscriberFn, SubscriptionId, SubscriptionRegistry};
use cfpreview_types::{Entry, EntryId, FieldDeltas};
use parking_lot::{Mutex, ReentrantMutex};
use std::sync::{Arc, Weak};
use tracing::debug;

pub struct SnapshotHub {
    gate: ReentrantMutex<()>,
    cache: Mutex<SnapshotCache>,
    registry: Mutex<SubscriptionRegistry>,
    counters: Arc<Counters>,
}

impl SnapshotHub {
    pub fn new(counters: Arc<Counters>) -> Arc<Self> {
        Arc::new(Self {
            gate: ReentrantMutex::new(()),
            cache: Mutex::new(SnapshotCache::new()),
            registry: Mutex::new(SubscriptionRegistry::new()),
            counters,
        })
    }

    pub fn get(&self, entry_id: &EntryId) -> Option<Arc<Entry>> {
        self.cache.lock().get(entry_id)
    }

    /// Replaces an entry's snapshot and notifies its subscribers.
    pub fn put(&self, entry: Entry) -> Arc<Entry> {
        let _gate = self.gate.lock();
        let (snapshot, callbacks) = {
            let mut cache = self.cache.lock();
            let snapshot = cache.put(entry);
            let callbacks = self.registry.lock().callbacks(snapshot.id());
            (snapshot, callbacks)
        };
        self.dispatch(&snapshot, &callbacks);
        snapshot
    }

    /// Merges deltas into an entry's snapshot and notifies its subscribers.
    /// Returns `None` when the entry is not cached.
    pub fn merge_batch(&self, entry_id: &EntryId, deltas: &FieldDeltas) -> Option<Arc<Entry>> {
        let _gate = self.gate.lock();
        let (snapshot, callbacks) = {
            let mut cache = self.cache.lock();
            let snapshot = cache.merge_batch(entry_id, deltas)?;
            let callbacks = self.registry.lock().callbacks(entry_id);
            (snapshot, callbacks)
        };
        debug!(
            "Merged {} field(s) into entry {} (revision {})",
            deltas.len(),
            entry_id,
            snapshot.revision()
        );
        self.dispatch(&snapshot, &callbacks);
        Some(snapshot)
    }

    /// Registers a callback and immediately hands it the cached snapshot, if any.
    pub fn subscribe(self: &Arc<Self>, entry_id: EntryId, callback: SubscriberFn) -> Subscription {
        let _gate = self.gate.lock();
        let (id, current) = {
            let cache = self.cache.lock();
            let current = cache.get(&entry_id);
            let id = self
                .registry
                .lock()
                .subscribe(entry_id.clone(), Arc::clone(&callback));
            (id, current)
        };

        if let Some(snapshot) = current {
            self.dispatch(&snapshot, std::slice::from_ref(&callback));
        }

        Subscription {
            entry_id,
            id,
            hub: Arc::downgrade(self),
        }
    }

    pub fn unsubscribe(&self, entry_id: &EntryId, id: SubscriptionId) -> bool {
        self.registry.lock().unsubscribe(entry_id, id)
    }

    /// Drops every snapshot and subscription.
    pub fn clear(&self) {
        let _gate = self.gate.lock();
        let mut cache = self.cache.lock();
        cache.clear();
        self.registry.lock().clear();
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn subscribed_entries(&self) -> usize {
        self.registry.lock().entry_count()
    }

    pub fn subscription_count(&self) -> usize {
        self.registry.lock().subscription_count()
    }

    /// Delivers `snapshot` while it is still the cached one. Must be called
    /// with the gate held.
    fn dispatch(&self, snapshot: &Arc<Entry>, callbacks: &[SubscriberFn]) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for callback in callbacks {
            if !self.is_current(snapshot) {
                debug!(
                    "Snapshot of entry {} (revision {}) superseded during delivery",
                    snapshot.id(),
                    snapshot.revision()
                );
                break;
            }
            let round = deliver(snapshot, std::slice::from_ref(callback));
            report.delivered += round.delivered;
            report.failed += round.failed;
        }
        self.counters.callbacks_failed(report.failed);
        report
    }

    fn is_current(&self, snapshot: &Arc<Entry>) -> bool {
        self.cache
            .lock()
            .get(snapshot.id())
            .is_some_and(|cached| Arc::ptr_eq(&cached, snapshot))
    }
}

/// Handle for one subscription.
///
/// Dropping the handle does not unsubscribe; call [`Subscription::unsubscribe`].
#[derive(Debug)]
pub struct Subscription {
    entry_id: EntryId,
    id: SubscriptionId,
    hub: Weak<SnapshotHub>,
}

impl Subscription {
    /// A handle that was never registered with any hub.
    pub(crate) fn detached(entry_id: EntryId) -> Self {
        Self {
            entry_id,
            id: SubscriptionId::new(),
            hub: Weak::new(),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn entry_id(&self) -> &EntryId {
        &self.entry_id
    }

    /// Stops delivery to this subscription's callback.
    /// Returns false if it was already removed (e.g. by session shutdown).
    pub fn unsubscribe(self) -> bool {
        match self.hub.upgrade() {
            Some(hub) => hub.unsubscribe(&self.entry_id, self.id),
            None => false,
        }
    }
}
