//! Preview panel model: view modes, per-entry configuration and entry types.

use crate::error::StoreError;
use cfpreview_types::{Entry, EntryId, FieldValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Device frame the preview is rendered in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Tablet => "tablet",
            Self::Mobile => "mobile",
        }
    }

    /// Viewport width in CSS pixels, `None` for full width.
    pub fn viewport_width(&self) -> Option<u32> {
        match self {
            Self::Desktop => None,
            Self::Tablet => Some(768),
            Self::Mobile => Some(375),
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(Self::Desktop),
            "tablet" => Ok(Self::Tablet),
            "mobile" => Ok(Self::Mobile),
            other => Err(StoreError::InvalidViewMode(other.to_string())),
        }
    }
}

/// Display settings remembered for one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryConfiguration {
    pub entry_id: EntryId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_hidden_fields: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_fields: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_settings: Option<BTreeMap<String, FieldValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl EntryConfiguration {
    /// A configuration with nothing set.
    pub fn empty(entry_id: EntryId) -> Self {
        Self {
            entry_id,
            show_hidden_fields: None,
            highlight_fields: None,
            debug_mode: None,
            custom_settings: None,
            version: None,
            last_modified: None,
        }
    }

    /// The configuration a freshly opened entry starts with.
    pub fn initial(entry_id: EntryId) -> Self {
        Self {
            show_hidden_fields: Some(false),
            highlight_fields: Some(true),
            debug_mode: Some(false),
            ..Self::empty(entry_id)
        }
    }

    /// Overwrites every setting the patch carries.
    pub fn apply(&mut self, patch: &ConfigurationPatch) {
        if let Some(v) = patch.show_hidden_fields {
            self.show_hidden_fields = Some(v);
        }
        if let Some(v) = patch.highlight_fields {
            self.highlight_fields = Some(v);
        }
        if let Some(v) = patch.debug_mode {
            self.debug_mode = Some(v);
        }
        if let Some(settings) = &patch.custom_settings {
            self.custom_settings = Some(settings.clone());
        }
        if let Some(v) = patch.version {
            self.version = Some(v);
        }
    }

    pub fn shows_hidden_fields(&self) -> bool {
        self.show_hidden_fields.unwrap_or(false)
    }

    pub fn highlights_fields(&self) -> bool {
        self.highlight_fields.unwrap_or(true)
    }
}

/// Partial update to an [`EntryConfiguration`]. Unset members are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_hidden_fields: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_fields: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_settings: Option<BTreeMap<String, FieldValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

impl ConfigurationPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_hidden_fields(mut self, value: bool) -> Self {
        self.show_hidden_fields = Some(value);
        self
    }

    pub fn highlight_fields(mut self, value: bool) -> Self {
        self.highlight_fields = Some(value);
        self
    }

    pub fn debug_mode(mut self, value: bool) -> Self {
        self.debug_mode = Some(value);
        self
    }

    pub fn custom_setting(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.custom_settings
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn version(mut self, value: u64) -> Self {
        self.version = Some(value);
        self
    }
}

/// A preview-capable content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryTypeDefinition {
    pub id: String,
    pub name: String,
    pub content_type_id: String,
    /// Applied on top of the initial configuration when an entry of this
    /// type is first opened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_configuration: Option<ConfigurationPatch>,
}

impl EntryTypeDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        content_type_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content_type_id: content_type_id.into(),
            default_configuration: None,
        }
    }

    pub fn with_default_configuration(mut self, patch: ConfigurationPatch) -> Self {
        self.default_configuration = Some(patch);
        self
    }

    /// Whether `entry` is of this type.
    pub fn matches(&self, entry: &Entry) -> bool {
        entry.content_type_id() == self.content_type_id
    }
}
