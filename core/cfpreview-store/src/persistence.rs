//! Persisted preview preferences.
//!
//! Only the view mode and the per-entry configurations outlive a process;
//! which entry is open is session state and is never written.

use crate::error::StoreResult;
use crate::model::{EntryConfiguration, ViewMode};
use cfpreview_types::EntryId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The persisted slice of preview state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedPreferences {
    #[serde(default)]
    pub view_mode: ViewMode,
    #[serde(default)]
    pub configurations: BTreeMap<EntryId, EntryConfiguration>,
}

/// Backend that preferences are loaded from and saved to.
pub trait PreferenceStore: Send + Sync {
    /// Returns the saved preferences, or `None` if nothing was saved yet.
    fn load(&self) -> StoreResult<Option<PersistedPreferences>>;

    /// Replaces the saved preferences.
    fn save(&self, preferences: &PersistedPreferences) -> StoreResult<()>;
}

/// In-memory backend, for tests and for hosts without durable storage.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    saved: Mutex<Option<PersistedPreferences>>,
    saves: Mutex<usize>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts out holding `preferences`, as if saved by an earlier process.
    pub fn with_saved(preferences: PersistedPreferences) -> Self {
        Self {
            saved: Mutex::new(Some(preferences)),
            saves: Mutex::new(0),
        }
    }

    pub fn saved(&self) -> Option<PersistedPreferences> {
        self.saved.lock().clone()
    }

    /// Number of times [`PreferenceStore::save`] was called.
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn load(&self) -> StoreResult<Option<PersistedPreferences>> {
        Ok(self.saved.lock().clone())
    }

    fn save(&self, preferences: &PersistedPreferences) -> StoreResult<()> {
        *self.saved.lock() = Some(preferences.clone());
        *self.saves.lock() += 1;
        Ok(())
    }
}

/// JSON file backend.
///
/// Writes go to a sibling temp file that is then renamed over the target,
/// so a crash mid-write leaves the previous preferences intact.
#[derive(Debug, Clone)]
pub struct JsonFilePreferences {
    path: PathBuf,
}

impl JsonFilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PreferenceStore for JsonFilePreferences {
    fn load(&self) -> StoreResult<Option<PersistedPreferences>> {
        if !self.path.exists() {
            debug!("No saved preview preferences at {:?}", self.path);
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, preferences: &PersistedPreferences) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(preferences)?;
        let temp = self.temp_path();
        fs::write(&temp, content)?;
        fs::rename(&temp, &self.path)?;
        debug!("Saved preview preferences to {:?}", self.path);
        Ok(())
    }
}
