//! Preview panel state for cfpreview.
//!
//! [`PreviewStore`] holds what the preview panel shows and how: the open
//! entry, its content type, the device frame and per-entry display settings.
//! View mode and settings are persisted through a [`PreferenceStore`].

mod error;
pub mod model;
pub mod persistence;
mod store;

pub use error::{StoreError, StoreResult};
pub use model::{ConfigurationPatch, EntryConfiguration, EntryTypeDefinition, ViewMode};
pub use persistence::{JsonFilePreferences, MemoryPreferences, PersistedPreferences, PreferenceStore};
pub use store::PreviewStore;
