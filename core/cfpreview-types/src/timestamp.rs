//! Receipt stamps for ordering inbound field updates.
//!
//! The host editor streams keystroke-level updates, often several within the
//! same millisecond. A receipt stamp pairs the wall clock with a sequence
//! counter so stamps issued by one [`ReceiptClock`] are strictly increasing in
//! arrival order, even when the wall clock stalls or steps backwards.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};

fn wall_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// The moment a field update was received.
///
/// Consists of:
/// - `wall_time`: Milliseconds since Unix epoch
/// - `sequence`: Counter for updates received within the same millisecond
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReceiptStamp {
    wall_time: u64,
    sequence: u32,
}

impl ReceiptStamp {
    /// Creates a stamp at the current time.
    #[must_use]
    pub fn now() -> Self {
        Self {
            wall_time: wall_millis(),
            sequence: 0,
        }
    }

    /// Creates a stamp from components.
    #[must_use]
    pub const fn new(wall_time: u64, sequence: u32) -> Self {
        Self {
            wall_time,
            sequence,
        }
    }

    /// Returns the wall time component.
    #[must_use]
    pub const fn wall_time(&self) -> u64 {
        self.wall_time
    }

    /// Returns the sequence counter.
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Returns the stamp that follows this one at wall time `now`.
    #[must_use]
    pub fn successor(&self, now: u64) -> Self {
        if now > self.wall_time {
            Self {
                wall_time: now,
                sequence: 0,
            }
        } else {
            Self {
                wall_time: self.wall_time,
                sequence: self.sequence.saturating_add(1),
            }
        }
    }

    /// Returns true if this stamp was issued before the other.
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self < other
    }
}

impl Default for ReceiptStamp {
    fn default() -> Self {
        Self::now()
    }
}

impl PartialOrd for ReceiptStamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReceiptStamp {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.wall_time.cmp(&other.wall_time) {
            Ordering::Equal => self.sequence.cmp(&other.sequence),
            other => other,
        }
    }
}

/// Issues strictly increasing receipt stamps.
#[derive(Debug, Clone, Default)]
pub struct ReceiptClock {
    last: Option<ReceiptStamp>,
}

impl ReceiptClock {
    /// Creates a clock that has not issued any stamps yet.
    #[must_use]
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Issues the next stamp using the system clock.
    pub fn stamp(&mut self) -> ReceiptStamp {
        self.stamp_at(wall_millis())
    }

    /// Issues the next stamp as if the wall clock read `now`.
    pub fn stamp_at(&mut self, now: u64) -> ReceiptStamp {
        let next = match self.last {
            Some(last) => last.successor(now),
            None => ReceiptStamp::new(now, 0),
        };
        self.last = Some(next);
        next
    }

    /// Returns the most recently issued stamp.
    #[must_use]
    pub fn last(&self) -> Option<ReceiptStamp> {
        self.last
    }
}
