//! Update queue and batcher.
//!
//! The host editor can stream many keystroke-level edits per second.
//! Re-rendering per edit would thrash the preview, so edits are queued and a
//! drain cycle later folds everything queued for one entry into a single
//! field-delta merge.
//!
//! Drain cycles are strictly sequential. Edits arriving while a cycle is
//! applying wait for it to finish; the batcher then schedules a follow-up
//! cycle after the retrigger delay instead of draining again inline.

use crate::hub::SnapshotHub;
use crate::metrics::Counters;
use crate::scheduler::Scheduler;
use cfpreview_types::{EntryId, FieldDeltas, FieldUpdateEvent, ReceiptClock};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::debug;

/// Delay before the first drain after an edit arrives on an idle queue.
pub const DEFAULT_DRAIN_DELAY: Duration = Duration::ZERO;

/// Delay before a follow-up drain for edits that arrived mid-cycle.
pub const DEFAULT_RETRIGGER_DELAY: Duration = Duration::from_millis(100);

/// Drain scheduling delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchTiming {
    pub drain_delay: Duration,
    pub retrigger_delay: Duration,
}

impl Default for BatchTiming {
    fn default() -> Self {
        Self {
            drain_delay: DEFAULT_DRAIN_DELAY,
            retrigger_delay: DEFAULT_RETRIGGER_DELAY,
        }
    }
}

/// Outcome of one drain cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Events taken off the queue.
    pub events: usize,
    /// Entries whose snapshot was updated, in first-seen order.
    pub applied: Vec<EntryId>,
    /// Entries skipped because they had no cached snapshot.
    pub dropped: Vec<EntryId>,
}

#[derive(Default)]
struct QueueState {
    pending: Vec<FieldUpdateEvent>,
    processing: bool,
    scheduled: bool,
    clock: ReceiptClock,
}

pub struct UpdateBatcher {
    state: Mutex<QueueState>,
    hub: Arc<SnapshotHub>,
    scheduler: Arc<dyn Scheduler>,
    counters: Arc<Counters>,
    timing: BatchTiming,
    this: Weak<UpdateBatcher>,
}

impl UpdateBatcher {
    pub fn new(
        hub: Arc<SnapshotHub>,
        scheduler: Arc<dyn Scheduler>,
        counters: Arc<Counters>,
        timing: BatchTiming,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            state: Mutex::new(QueueState::default()),
            hub,
            scheduler,
            counters,
            timing,
            this: this.clone(),
        })
    }

    /// Queues an edit. Never blocks and never drains inline.
    ///
    /// The event is re-stamped on receipt so arrival order is what decides
    /// which value wins within a cycle.
    pub fn enqueue(&self, mut event: FieldUpdateEvent) {
        let needs_drain = {
            let mut state = self.state.lock();
            event.received_at = state.clock.stamp();
            state.pending.push(event);
            if !state.processing && !state.scheduled {
                state.scheduled = true;
                true
            } else {
                false
            }
        };

        if needs_drain {
            self.schedule_drain(self.timing.drain_delay);
        }
    }

    /// Runs one drain cycle.
    ///
    /// Returns an empty report if a cycle is already running or nothing is queued.
    pub fn drain(&self) -> DrainReport {
        let batch = {
            let mut state = self.state.lock();
            if state.processing {
                return DrainReport::default();
            }
            state.scheduled = false;
            if state.pending.is_empty() {
                return DrainReport::default();
            }
            state.processing = true;
            std::mem::take(&mut state.pending)
        };

        let guard = ProcessingGuard {
            state: &self.state,
            armed: true,
        };
        let report = self.apply(batch);
        guard.disarm();

        let needs_retrigger = {
            let mut state = self.state.lock();
            state.processing = false;
            if !state.pending.is_empty() && !state.scheduled {
                state.scheduled = true;
                true
            } else {
                false
            }
        };

        self.counters.drain_completed();
        if needs_retrigger {
            self.schedule_drain(self.timing.retrigger_delay);
        }
        report
    }

    /// Number of edits waiting for the next cycle.
    pub fn queued(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn is_processing(&self) -> bool {
        self.state.lock().processing
    }

    pub fn timing(&self) -> BatchTiming {
        self.timing
    }

    fn schedule_drain(&self, delay: Duration) {
        let this = self.this.clone();
        self.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(batcher) = this.upgrade() {
                    batcher.drain();
                }
            }),
        );
    }

    fn apply(&self, batch: Vec<FieldUpdateEvent>) -> DrainReport {
        let mut report = DrainReport {
            events: batch.len(),
            ..Default::default()
        };

        for (entry_id, events) in group_by_entry(batch) {
            let deltas = FieldDeltas::from_events(&events);
            match self.hub.merge_batch(&entry_id, &deltas) {
                Some(_) => report.applied.push(entry_id),
                None => {
                    debug!(
                        "Dropping {} update(s) for uncached entry {}",
                        events.len(),
                        entry_id
                    );
                    self.counters.update_dropped();
                    report.dropped.push(entry_id);
                }
            }
        }

        report
    }
}

/// Clears the processing flag if a drain cycle unwinds, so a panic while
/// applying cannot leave the queue refusing every later cycle.
struct ProcessingGuard<'a> {
    state: &'a Mutex<QueueState>,
    armed: bool,
}

impl ProcessingGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.lock().processing = false;
        }
    }
}

/// Groups events by entry, keeping entries in first-seen order and events in
/// arrival order within each entry.
fn group_by_entry(batch: Vec<FieldUpdateEvent>) -> Vec<(EntryId, Vec<FieldUpdateEvent>)> {
    let mut index: HashMap<EntryId, usize> = HashMap::new();
    let mut groups: Vec<(EntryId, Vec<FieldUpdateEvent>)> = Vec::new();

    for event in batch {
        match index.get(&event.entry_id) {
            Some(&i) => groups[i].1.push(event),
            None => {
                index.insert(event.entry_id.clone(), groups.len());
                groups.push((event.entry_id.clone(), vec![event]));
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping_preserves_first_seen_order() {
        let batch = vec![
            FieldUpdateEvent::new("b", "title", "en-US", "1"),
            FieldUpdateEvent::new("a", "title", "en-US", "2"),
            FieldUpdateEvent::new("b", "title", "en-US", "3"),
        ];

        let groups = group_by_entry(batch);
        let ids: Vec<&str> = groups.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[0].1[1].value, "3");
    }

    #[test]
    fn guard_clears_processing_on_unwind() {
        let state = Mutex::new(QueueState {
            processing: true,
            ..Default::default()
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = ProcessingGuard {
                state: &state,
                armed: true,
            };
            panic!("apply failed");
        }));

        assert!(result.is_err());
        assert!(!state.lock().processing);
    }

    #[test]
    fn disarmed_guard_leaves_state_alone() {
        let state = Mutex::new(QueueState {
            processing: true,
            ..Default::default()
        });

        ProcessingGuard {
            state: &state,
            armed: true,
        }
        .disarm();

        assert!(state.lock().processing);
    }
}
