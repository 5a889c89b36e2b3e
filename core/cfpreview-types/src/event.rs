//! Field update events and the deltas built from them.
//!
//! A [`FieldUpdateEvent`] is one edit streamed by the host editor. Events only
//! live in the update queue; a drain cycle folds every event for one entry
//! into a [`FieldDeltas`] map, keeping the last value received per field.

use crate::{EntryId, FieldValue, ReceiptStamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One field-level edit received from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldUpdateEvent {
    pub entry_id: EntryId,
    pub field_id: String,
    pub locale: String,
    pub value: FieldValue,
    pub received_at: ReceiptStamp,
}

impl FieldUpdateEvent {
    /// Creates an event stamped with the current time.
    pub fn new(
        entry_id: impl Into<EntryId>,
        field_id: impl Into<String>,
        locale: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Self {
        Self {
            entry_id: entry_id.into(),
            field_id: field_id.into(),
            locale: locale.into(),
            value: value.into(),
            received_at: ReceiptStamp::now(),
        }
    }

    /// Overrides the receipt stamp.
    pub fn received_at(mut self, stamp: ReceiptStamp) -> Self {
        self.received_at = stamp;
        self
    }
}

/// Proposed new field values for one entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldDeltas {
    values: BTreeMap<String, FieldValue>,
}

impl FieldDeltas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds events into deltas in the order given; later events win.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a FieldUpdateEvent>) -> Self {
        let mut deltas = Self::new();
        for event in events {
            deltas.record(event.field_id.clone(), event.value.clone());
        }
        deltas
    }

    /// Records a value for a field, replacing any earlier value.
    pub fn record(&mut self, field_id: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.insert(field_id.into(), value.into());
    }

    /// Builder form of [`FieldDeltas::record`].
    pub fn with(mut self, field_id: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.record(field_id, value);
        self
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.values.get(field_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
