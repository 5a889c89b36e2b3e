//! Subscription registry.
//!
//! Maps entry ids to the view callbacks interested in them. Delivery isolates
//! callbacks from each other: one subscriber returning an error or panicking
//! is logged and skipped, and the rest still receive the snapshot.

use crate::error::SubscriberResult;
use cfpreview_types::{Entry, EntryId};
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// A view callback receiving entry snapshots.
pub type SubscriberFn = Arc<dyn Fn(&Entry) -> SubscriberResult + Send + Sync>;

/// Identifies one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of one notification round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Callbacks that returned `Ok`.
    pub delivered: usize,
    /// Callbacks that returned an error or panicked.
    pub failed: usize,
}

/// Entry id → callbacks.
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscribers: HashMap<EntryId, Vec<(SubscriptionId, SubscriberFn)>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback for an entry.
    pub fn subscribe(&mut self, entry_id: EntryId, callback: SubscriberFn) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.subscribers
            .entry(entry_id)
            .or_default()
            .push((id, callback));
        id
    }

    /// Removes a callback. Drops the entry mapping once it has no callbacks left.
    pub fn unsubscribe(&mut self, entry_id: &EntryId, id: SubscriptionId) -> bool {
        let Some(callbacks) = self.subscribers.get_mut(entry_id) else {
            return false;
        };
        let before = callbacks.len();
        callbacks.retain(|(sid, _)| *sid != id);
        let removed = callbacks.len() != before;
        if callbacks.is_empty() {
            self.subscribers.remove(entry_id);
        }
        removed
    }

    /// Returns the callbacks currently registered for an entry.
    pub fn callbacks(&self, entry_id: &EntryId) -> Vec<SubscriberFn> {
        self.subscribers
            .get(entry_id)
            .map(|cbs| cbs.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default()
    }

    /// Invokes every callback registered for an entry.
    ///
    /// Callbacks run while the registry is borrowed; callers that let
    /// subscribers re-enter the registry should collect [`Self::callbacks`]
    /// and use [`deliver`] instead.
    pub fn notify(&self, entry_id: &EntryId, entry: &Entry) -> DeliveryReport {
        match self.subscribers.get(entry_id) {
            Some(cbs) => cbs.iter().fold(DeliveryReport::default(), |mut report, (_, cb)| {
                record(&mut report, invoke(cb, entry));
                report
            }),
            None => DeliveryReport::default(),
        }
    }

    pub fn is_subscribed(&self, entry_id: &EntryId) -> bool {
        self.subscribers.contains_key(entry_id)
    }

    /// Number of entries with at least one subscriber.
    pub fn entry_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Total number of subscriptions across all entries.
    pub fn subscription_count(&self) -> usize {
        self.subscribers.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.subscribers.clear();
    }
}

/// Invokes each callback with `entry`, isolating failures.
pub fn deliver(entry: &Entry, callbacks: &[SubscriberFn]) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    for callback in callbacks {
        record(&mut report, invoke(callback, entry));
    }
    report
}

fn record(report: &mut DeliveryReport, ok: bool) {
    if ok {
        report.delivered += 1;
    } else {
        report.failed += 1;
    }
}

fn invoke(callback: &SubscriberFn, entry: &Entry) -> bool {
    match catch_unwind(AssertUnwindSafe(|| callback(entry))) {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!("Live preview subscriber for entry {} failed: {}", entry.id(), e);
            false
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!("Live preview subscriber for entry {} panicked: {}", entry.id(), message);
            false
        }
    }
}
