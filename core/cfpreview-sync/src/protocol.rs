//! Messages exchanged with the host editor.
//!
//! The host (the CMS web app embedding the preview in an iframe) and the
//! preview talk over a cross-origin message channel. Every message is a JSON
//! object tagged by `type`:
//!
//! - host → preview: field-level edits and whole-entry replacements
//! - preview → host: a ready handshake and requests to open a field editor

use crate::error::PreviewResult;
use cfpreview_types::{Entry, EntryId, FieldValue};
use serde::{Deserialize, Serialize};

pub const FIELD_UPDATE: &str = "CONTENTFUL_FIELD_UPDATE";
pub const ENTRY_UPDATE: &str = "CONTENTFUL_ENTRY_UPDATE";
pub const PREVIEW_READY: &str = "PREVIEW_READY";
pub const OPEN_FIELD_EDITOR: &str = "OPEN_FIELD_EDITOR";

/// A message received from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    /// One field of one entry changed in the editor.
    #[serde(rename = "CONTENTFUL_FIELD_UPDATE")]
    FieldUpdate(FieldUpdateMessage),

    /// A complete, already merged entry.
    #[serde(rename = "CONTENTFUL_ENTRY_UPDATE")]
    EntryUpdate(EntryUpdateMessage),
}

impl InboundMessage {
    /// Decodes a raw message payload.
    pub fn decode(data: &serde_json::Value) -> PreviewResult<Self> {
        Ok(Self::deserialize(data)?)
    }

    /// Returns the wire `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FieldUpdate(_) => FIELD_UPDATE,
            Self::EntryUpdate(_) => ENTRY_UPDATE,
        }
    }

    /// Returns the entry the message refers to.
    pub fn entry_id(&self) -> &EntryId {
        match self {
            Self::FieldUpdate(m) => &m.entry_id,
            Self::EntryUpdate(m) => &m.entry_id,
        }
    }
}

/// Field-level edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldUpdateMessage {
    pub entry_id: EntryId,
    pub field_id: String,
    /// Missing locales fall back to the session locale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default)]
    pub value: FieldValue,
}

/// Whole-entry replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryUpdateMessage {
    pub entry_id: EntryId,
    pub entry: Entry,
}

/// A message sent to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    /// Handshake announcing what this preview supports.
    #[serde(rename = "PREVIEW_READY")]
    PreviewReady(PreviewReadyMessage),

    /// Ask the host to open its editor for one field.
    #[serde(rename = "OPEN_FIELD_EDITOR")]
    OpenFieldEditor(OpenFieldEditorMessage),
}

impl OutboundMessage {
    /// Encodes the message as a JSON payload.
    pub fn encode(&self) -> PreviewResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Returns the wire `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PreviewReady(_) => PREVIEW_READY,
            Self::OpenFieldEditor(_) => OPEN_FIELD_EDITOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewReadyMessage {
    pub config: ReadyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyConfig {
    pub locale: String,
    pub capabilities: Capabilities,
}

/// Features the host can rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub live_updates: bool,
    pub inspector_mode: bool,
}

impl PreviewReadyMessage {
    pub fn new(locale: impl Into<String>, capabilities: Capabilities) -> Self {
        Self {
            config: ReadyConfig {
                locale: locale.into(),
                capabilities,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenFieldEditorMessage {
    pub entry_id: EntryId,
    pub field_id: String,
    pub locale: String,
}
