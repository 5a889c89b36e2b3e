//! Click-to-edit inspector attributes.
//!
//! A rendered field carries data attributes naming its entry, field and
//! locale. Clicking it asks the host to open its own editor for exactly that
//! field. The request is fire-and-forget: the preview never waits for an
//! answer.

use crate::bridge::TransportBridge;
use crate::config::SessionConfig;
use crate::protocol::{OpenFieldEditorMessage, OutboundMessage};
use cfpreview_types::EntryId;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

pub const ATTR_ENTRY_ID: &str = "data-contentful-entry-id";
pub const ATTR_FIELD_ID: &str = "data-contentful-field-id";
pub const ATTR_LOCALE: &str = "data-contentful-locale";
pub const ATTR_INSPECTOR: &str = "data-contentful-inspector";

const DEBUG_OUTLINE: &str = "1px dashed #3b82f6";

/// Hover highlighting for inspectable elements, keyed off [`ATTR_INSPECTOR`].
pub const INSPECTOR_STYLESHEET: &str = r#"[data-contentful-inspector="true"]:hover {
  outline: 2px dashed #3b82f6 !important;
  outline-offset: 2px;
}

[data-contentful-inspector="true"]:hover::after {
  content: "Click to edit";
  position: absolute;
  background: #3b82f6;
  color: white;
  padding: 2px 6px;
  font-size: 12px;
  border-radius: 3px;
  z-index: 1000;
  pointer-events: none;
  transform: translateY(-100%);
}
"#;

/// The UI event a click handler receives.
pub trait InspectorEvent {
    fn prevent_default(&mut self);
    fn stop_propagation(&mut self);
}

/// Plain event record for hosts without a native event object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickEvent {
    pub default_prevented: bool,
    pub propagation_stopped: bool,
}

impl InspectorEvent for ClickEvent {
    fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }
}

/// Sends an open-field-editor request for one field.
#[derive(Clone)]
pub struct InspectorClickHandler {
    target: OpenFieldEditorMessage,
    bridge: Weak<TransportBridge>,
}

impl InspectorClickHandler {
    pub fn target(&self) -> &OpenFieldEditorMessage {
        &self.target
    }

    /// Consumes the click and asks the host to open the field editor.
    /// Returns whether the request was handed to the channel.
    pub fn click(&self, event: &mut dyn InspectorEvent) -> bool {
        event.prevent_default();
        event.stop_propagation();
        match self.bridge.upgrade() {
            Some(bridge) => bridge.send(&OutboundMessage::OpenFieldEditor(self.target.clone())),
            None => false,
        }
    }
}

impl fmt::Debug for InspectorClickHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InspectorClickHandler")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Attributes, style hints and click handler for one inspectable element.
#[derive(Debug, Clone, Default)]
pub struct InspectorProps {
    attributes: BTreeMap<&'static str, String>,
    style: BTreeMap<&'static str, String>,
    on_click: Option<InspectorClickHandler>,
}

impl InspectorProps {
    /// Props that do nothing (inspector mode off).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.on_click.is_none()
    }

    pub fn attributes(&self) -> &BTreeMap<&'static str, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn style(&self) -> &BTreeMap<&'static str, String> {
        &self.style
    }

    pub fn on_click(&self) -> Option<&InspectorClickHandler> {
        self.on_click.as_ref()
    }

    /// Renders the data attributes as an HTML attribute string.
    pub fn to_html_attributes(&self) -> String {
        self.attributes
            .iter()
            .map(|(name, value)| format!("{name}=\"{}\"", escape_attribute(value)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Builds inspector props for a session.
pub struct InspectorProvider {
    enabled: bool,
    debug_mode: bool,
    default_locale: String,
    bridge: Weak<TransportBridge>,
}

impl InspectorProvider {
    /// Inspector mode needs a bridge to talk to; without one props are always empty.
    pub fn new(config: &SessionConfig, bridge: Option<&Arc<TransportBridge>>) -> Self {
        Self {
            enabled: config.enable_inspector_mode && bridge.is_some(),
            debug_mode: config.debug_mode,
            default_locale: config.locale.clone(),
            bridge: bridge.map(Arc::downgrade).unwrap_or_default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Props for one field. `locale` defaults to the session locale.
    pub fn props(&self, entry_id: &EntryId, field_id: &str, locale: Option<&str>) -> InspectorProps {
        if !self.enabled {
            return InspectorProps::empty();
        }

        let locale = locale.unwrap_or(&self.default_locale).to_string();

        let mut attributes = BTreeMap::new();
        attributes.insert(ATTR_ENTRY_ID, entry_id.to_string());
        attributes.insert(ATTR_FIELD_ID, field_id.to_string());
        attributes.insert(ATTR_LOCALE, locale.clone());
        attributes.insert(ATTR_INSPECTOR, "true".to_string());

        let mut style = BTreeMap::new();
        style.insert("cursor", "pointer".to_string());
        style.insert(
            "outline",
            if self.debug_mode { DEBUG_OUTLINE } else { "none" }.to_string(),
        );

        InspectorProps {
            attributes,
            style,
            on_click: Some(InspectorClickHandler {
                target: OpenFieldEditorMessage {
                    entry_id: entry_id.clone(),
                    field_id: field_id.to_string(),
                    locale,
                },
                bridge: self.bridge.clone(),
            }),
        }
    }
}
