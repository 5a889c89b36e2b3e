//! Contentful-shaped entries.
//!
//! An entry is a `sys` block of platform metadata plus a flat map of field
//! values. Field contents are opaque to the preview engine: it moves values
//! around and merges them at the field level, but never looks inside them.

use crate::event::FieldDeltas;
use crate::{EntryId, Error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single field value. Structure is defined by the content model.
pub type FieldValue = serde_json::Value;

/// Field id → value.
pub type Fields = BTreeMap<String, FieldValue>;

/// Link to a content type.
pub type ContentTypeLink = Link;

/// A Contentful link object (`{"sys": {"type": "Link", ...}}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub sys: LinkSys,
}

/// The `sys` block of a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSys {
    #[serde(rename = "type", default = "link_kind")]
    pub kind: String,
    pub link_type: String,
    pub id: String,
}

fn link_kind() -> String {
    "Link".to_string()
}

impl Link {
    /// Creates a link of the given kind (e.g. `ContentType`, `Entry`).
    pub fn new(link_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            sys: LinkSys {
                kind: link_kind(),
                link_type: link_type.into(),
                id: id.into(),
            },
        }
    }

    /// Creates a link to a content type.
    pub fn content_type(id: impl Into<String>) -> Self {
        Self::new("ContentType", id)
    }

    /// Returns the linked id.
    pub fn id(&self) -> &str {
        &self.sys.id
    }
}

/// Platform metadata of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySys {
    pub id: EntryId,
    pub content_type: ContentTypeLink,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// A CMS entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub sys: EntrySys,
    #[serde(default)]
    pub fields: Fields,
}

impl Entry {
    /// Creates an entry at revision 1 with no fields.
    pub fn new(id: impl Into<EntryId>, content_type_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            sys: EntrySys {
                id: id.into(),
                content_type: Link::content_type(content_type_id),
                created_at: now,
                updated_at: now,
                revision: 1,
                locale: None,
            },
            fields: Fields::new(),
        }
    }

    /// Sets a field value.
    pub fn with_field(mut self, field_id: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field_id.into(), value.into());
        self
    }

    /// Sets the revision.
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.sys.revision = revision;
        self
    }

    /// Sets the locale the fields are resolved in.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.sys.locale = Some(locale.into());
        self
    }

    /// Parses an entry from its JSON representation.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn id(&self) -> &EntryId {
        &self.sys.id
    }

    pub fn content_type_id(&self) -> &str {
        self.sys.content_type.id()
    }

    pub fn revision(&self) -> u64 {
        self.sys.revision
    }

    /// Returns a field value.
    pub fn field(&self, field_id: &str) -> Option<&FieldValue> {
        self.fields.get(field_id)
    }

    /// Returns a field value if it is text.
    pub fn field_str(&self, field_id: &str) -> Option<&str> {
        self.fields.get(field_id).and_then(|v| v.as_str())
    }

    /// Produces the next revision of this entry with `deltas` applied.
    ///
    /// Fields are replaced wholesale: a delta for a structured field
    /// overwrites it rather than merging into it. The revision always advances
    /// by one and `updatedAt` never moves backwards. Fails when the revision
    /// is already `u64::MAX`.
    pub fn merged(&self, deltas: &FieldDeltas, now: DateTime<Utc>) -> crate::Result<Self> {
        let revision = self
            .sys
            .revision
            .checked_add(1)
            .ok_or_else(|| Error::RevisionOverflow(self.sys.id.clone()))?;

        let mut fields = self.fields.clone();
        for (field_id, value) in deltas.iter() {
            fields.insert(field_id.clone(), value.clone());
        }

        Ok(Self {
            sys: EntrySys {
                updated_at: now.max(self.sys.updated_at),
                revision,
                ..self.sys.clone()
            },
            fields,
        })
    }
}

/// Classification of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    /// A link to another entry or asset.
    Reference,
    List,
    Object,
    Null,
}

impl FieldKind {
    /// Classifies a field value.
    pub fn of(value: &FieldValue) -> Self {
        match value {
            FieldValue::String(_) => Self::Text,
            FieldValue::Number(_) => Self::Number,
            FieldValue::Bool(_) => Self::Boolean,
            FieldValue::Array(_) => Self::List,
            FieldValue::Null => Self::Null,
            FieldValue::Object(map) => {
                let is_link = map
                    .get("sys")
                    .and_then(|sys| sys.get("type"))
                    .and_then(|t| t.as_str())
                    == Some("Link");
                if is_link { Self::Reference } else { Self::Object }
            }
        }
    }
}
