//! Session counters for debugging and the relay's metrics endpoint.
//!
//! None of these values affect behaviour.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters shared by the session's components.
#[derive(Debug, Default)]
pub struct Counters {
    dropped_messages: AtomicU64,
    dropped_updates: AtomicU64,
    failed_sends: AtomicU64,
    failed_callbacks: AtomicU64,
    drain_cycles: AtomicU64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    /// An inbound message was rejected (untrusted origin or bad payload).
    pub fn message_dropped(&self) {
        self.dropped_messages.fetch_add(1, Ordering::Relaxed);
    }

    /// A batch targeted an entry with no cached snapshot.
    pub fn update_dropped(&self) {
        self.dropped_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn send_failed(&self) {
        self.failed_sends.fetch_add(1, Ordering::Relaxed);
    }

    pub fn callbacks_failed(&self, n: usize) {
        if n > 0 {
            self.failed_callbacks.fetch_add(n as u64, Ordering::Relaxed);
        }
    }

    pub fn drain_completed(&self) {
        self.drain_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_messages(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    pub fn dropped_updates(&self) -> u64 {
        self.dropped_updates.load(Ordering::Relaxed)
    }

    pub fn failed_sends(&self) -> u64 {
        self.failed_sends.load(Ordering::Relaxed)
    }

    pub fn failed_callbacks(&self) -> u64 {
        self.failed_callbacks.load(Ordering::Relaxed)
    }

    pub fn drain_cycles(&self) -> u64 {
        self.drain_cycles.load(Ordering::Relaxed)
    }
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    /// Entries with at least one subscriber.
    pub subscribed_entries: usize,
    pub cached_entries: usize,
    /// Field updates waiting for the next drain.
    pub queued_updates: usize,
    /// Whether a drain cycle is currently applying batches.
    pub is_processing: bool,
    pub dropped_messages: u64,
    pub dropped_updates: u64,
    pub failed_sends: u64,
    pub failed_callbacks: u64,
    pub drain_cycles: u64,
}
