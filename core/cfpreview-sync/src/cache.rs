//! Entry snapshot cache.
//!
//! Holds the last known good snapshot of every entry being previewed. The
//! cache never mutates a snapshot in place: each write installs a new
//! `Arc<Entry>`, so readers holding an older snapshot keep a consistent view.

use cfpreview_types::{Entry, EntryId, FieldDeltas};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Entry id → current snapshot.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    entries: HashMap<EntryId, Arc<Entry>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current snapshot of an entry.
    pub fn get(&self, entry_id: &EntryId) -> Option<Arc<Entry>> {
        self.entries.get(entry_id).cloned()
    }

    /// Replaces the snapshot of an entry unconditionally.
    pub fn put(&mut self, entry: Entry) -> Arc<Entry> {
        let snapshot = Arc::new(entry);
        self.entries
            .insert(snapshot.id().clone(), Arc::clone(&snapshot));
        snapshot
    }

    /// Applies field deltas on top of the current snapshot.
    ///
    /// Returns `None` and leaves the cache untouched when no snapshot exists:
    /// the editor may stream edits for entries this preview never mounted.
    /// The same holds for a snapshot whose revision is already at its maximum.
    pub fn merge_batch(&mut self, entry_id: &EntryId, deltas: &FieldDeltas) -> Option<Arc<Entry>> {
        let current = self.entries.get(entry_id)?;
        let merged = match current.merged(deltas, Utc::now()) {
            Ok(merged) => merged,
            Err(e) => {
                warn!("Dropping {} field update(s): {}", deltas.len(), e);
                return None;
            }
        };
        let snapshot = Arc::new(merged);
        self.entries.insert(entry_id.clone(), Arc::clone(&snapshot));
        Some(snapshot)
    }

    pub fn remove(&mut self, entry_id: &EntryId) -> Option<Arc<Entry>> {
        self.entries.remove(entry_id)
    }

    pub fn contains(&self, entry_id: &EntryId) -> bool {
        self.entries.contains_key(entry_id)
    }

    pub fn entry_ids(&self) -> impl Iterator<Item = &EntryId> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
