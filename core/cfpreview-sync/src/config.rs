//! Session configuration.
//!
//! Loaded from JSON (camelCase keys, matching what the host page embeds) or
//! built in code. Immutable once a session is created.

use crate::batcher::{BatchTiming, DEFAULT_RETRIGGER_DELAY};
use crate::error::{PreviewError, PreviewResult};
use crate::protocol::Capabilities;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Origin of the Contentful web app.
pub const CONTENTFUL_APP_ORIGIN: &str = "https://app.contentful.com";

fn default_true() -> bool {
    true
}

fn default_retrigger_delay_ms() -> u64 {
    DEFAULT_RETRIGGER_DELAY.as_millis() as u64
}

/// Configuration for a live preview session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Locale fields are rendered in; default for inspector targets.
    pub locale: String,
    #[serde(default = "default_true")]
    pub enable_inspector_mode: bool,
    #[serde(default = "default_true")]
    pub enable_live_updates: bool,
    /// Outlines inspectable elements.
    #[serde(default)]
    pub debug_mode: bool,
    /// The only origin messages are accepted from and posted to.
    pub target_origin: String,
    #[serde(default)]
    pub drain_delay_ms: u64,
    #[serde(default = "default_retrigger_delay_ms")]
    pub retrigger_delay_ms: u64,
}

impl SessionConfig {
    /// Creates a config with default feature flags.
    pub fn new(locale: impl Into<String>, target_origin: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            enable_inspector_mode: true,
            enable_live_updates: true,
            debug_mode: false,
            target_origin: target_origin.into(),
            drain_delay_ms: 0,
            retrigger_delay_ms: default_retrigger_delay_ms(),
        }
    }

    pub fn with_inspector_mode(mut self, enabled: bool) -> Self {
        self.enable_inspector_mode = enabled;
        self
    }

    pub fn with_live_updates(mut self, enabled: bool) -> Self {
        self.enable_live_updates = enabled;
        self
    }

    pub fn with_debug_mode(mut self, enabled: bool) -> Self {
        self.debug_mode = enabled;
        self
    }

    pub fn with_timing(mut self, timing: BatchTiming) -> Self {
        self.drain_delay_ms = timing.drain_delay.as_millis() as u64;
        self.retrigger_delay_ms = timing.retrigger_delay.as_millis() as u64;
        self
    }

    /// Parses a config from JSON.
    pub fn from_json_str(json: &str) -> PreviewResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a config from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> PreviewResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PreviewError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// Checks that required settings are present.
    ///
    /// The trusted origin must be a concrete `scheme://host` origin: a
    /// wildcard would broadcast editor commands to any embedding page.
    pub fn validate(&self) -> PreviewResult<()> {
        if self.locale.trim().is_empty() {
            return Err(PreviewError::InvalidConfig("locale is required".into()));
        }
        let origin = self.target_origin.trim();
        if origin.is_empty() {
            return Err(PreviewError::InvalidConfig("target origin is required".into()));
        }
        if origin == "*" || !origin.contains("://") {
            return Err(PreviewError::InvalidConfig(format!(
                "target origin must be a scheme://host origin, got {origin:?}"
            )));
        }
        Ok(())
    }

    pub fn timing(&self) -> BatchTiming {
        BatchTiming {
            drain_delay: Duration::from_millis(self.drain_delay_ms),
            retrigger_delay: Duration::from_millis(self.retrigger_delay_ms),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            live_updates: self.enable_live_updates,
            inspector_mode: self.enable_inspector_mode,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new("en-US", CONTENTFUL_APP_ORIGIN)
    }
}
