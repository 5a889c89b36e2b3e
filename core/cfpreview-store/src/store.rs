//! Preview panel state.
//!
//! Tracks whether the preview panel is open, which entry it shows, the
//! device frame, and the display settings chosen per entry. Analytics events
//! are emitted as `tracing` events on the `cfpreview::analytics` target.

use crate::error::StoreResult;
use crate::model::{ConfigurationPatch, EntryConfiguration, EntryTypeDefinition, ViewMode};
use crate::persistence::{PersistedPreferences, PreferenceStore};
use cfpreview_types::{Entry, EntryId};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{info, warn};

const ANALYTICS: &str = "cfpreview::analytics";

pub struct PreviewStore {
    is_open: bool,
    view_mode: ViewMode,
    active_entry: Option<Entry>,
    entry_type: Option<EntryTypeDefinition>,
    configurations: BTreeMap<EntryId, EntryConfiguration>,
    preferences: Box<dyn PreferenceStore>,
}

impl PreviewStore {
    /// Creates a store, restoring view mode and configurations from
    /// `preferences`.
    pub fn open(preferences: Box<dyn PreferenceStore>) -> StoreResult<Self> {
        let saved = preferences.load()?.unwrap_or_default();
        Ok(Self {
            is_open: false,
            view_mode: saved.view_mode,
            active_entry: None,
            entry_type: None,
            configurations: saved.configurations,
            preferences,
        })
    }

    /// Shows `entry` in the preview panel.
    ///
    /// The first time an entry is opened it gets the initial configuration,
    /// overlaid with the entry type's defaults if a type is given.
    pub fn open_preview(&mut self, entry: Entry, entry_type: Option<EntryTypeDefinition>) {
        let entry_id = entry.id().clone();

        if let Some(def) = &entry_type {
            if !def.matches(&entry) {
                warn!(
                    "Entry {} has content type {}, not {}",
                    entry_id,
                    entry.content_type_id(),
                    def.content_type_id
                );
            }
        }

        if !self.configurations.contains_key(&entry_id) {
            let mut config = EntryConfiguration::initial(entry_id.clone());
            if let Some(defaults) = entry_type.as_ref().and_then(|t| t.default_configuration.as_ref()) {
                config.apply(defaults);
            }
            self.configurations.insert(entry_id.clone(), config);
            self.persist();
        }

        info!(
            target: ANALYTICS,
            event = "preview_opened",
            content_type = entry.content_type_id(),
            entry_id = %entry_id,
            "Preview opened"
        );

        self.is_open = true;
        self.active_entry = Some(entry);
        self.entry_type = entry_type;
    }

    /// Hides the panel. Returns false if it was already closed.
    pub fn close_preview(&mut self) -> bool {
        let was_open = self.is_open;
        self.is_open = false;
        self.active_entry = None;
        self.entry_type = None;

        if was_open {
            info!(target: ANALYTICS, event = "preview_closed", "Preview closed");
        }
        was_open
    }

    /// Merges `patch` into an entry's configuration, creating it if needed.
    pub fn update_configuration(&mut self, entry_id: &EntryId, patch: &ConfigurationPatch) -> &EntryConfiguration {
        self.update_configuration_at(entry_id, patch, Utc::now())
    }

    /// Like [`Self::update_configuration`] with an explicit modification time.
    pub fn update_configuration_at(
        &mut self,
        entry_id: &EntryId,
        patch: &ConfigurationPatch,
        now: DateTime<Utc>,
    ) -> &EntryConfiguration {
        let mut config = self
            .configurations
            .remove(entry_id)
            .unwrap_or_else(|| EntryConfiguration::empty(entry_id.clone()));
        config.apply(patch);
        config.last_modified = Some(now);
        self.configurations.insert(entry_id.clone(), config);
        self.persist();
        &self.configurations[entry_id]
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        let previous = std::mem::replace(&mut self.view_mode, mode);
        info!(
            target: ANALYTICS,
            event = "preview_view_mode_change",
            from_mode = previous.as_str(),
            to_mode = mode.as_str(),
            "Preview view mode changed"
        );
        self.persist();
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn active_entry(&self) -> Option<&Entry> {
        self.active_entry.as_ref()
    }

    pub fn entry_type(&self) -> Option<&EntryTypeDefinition> {
        self.entry_type.as_ref()
    }

    pub fn configuration(&self, entry_id: &EntryId) -> Option<&EntryConfiguration> {
        self.configurations.get(entry_id)
    }

    /// Configuration of the entry currently shown.
    pub fn active_configuration(&self) -> Option<&EntryConfiguration> {
        self.active_entry
            .as_ref()
            .and_then(|entry| self.configurations.get(entry.id()))
    }

    pub fn configurations(&self) -> impl Iterator<Item = &EntryConfiguration> {
        self.configurations.values()
    }

    /// Replaces the shown entry with a newer snapshot of the same entry.
    /// Returns false if the panel shows a different entry or none.
    pub fn refresh_active_entry(&mut self, entry: &Entry) -> bool {
        match &mut self.active_entry {
            Some(active) if active.id() == entry.id() => {
                *active = entry.clone();
                true
            }
            _ => false,
        }
    }

    /// The state that is written to the preference backend.
    pub fn preferences(&self) -> PersistedPreferences {
        PersistedPreferences {
            view_mode: self.view_mode,
            configurations: self.configurations.clone(),
        }
    }

    fn persist(&self) {
        if let Err(e) = self.preferences.save(&self.preferences()) {
            warn!("Failed to save preview preferences: {}", e);
        }
    }
}
