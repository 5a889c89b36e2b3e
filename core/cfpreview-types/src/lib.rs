//! Core type definitions for cfpreview.
//!
//! This crate defines the data model shared by the live preview engine and
//! the preview store:
//! - Entry identifiers (opaque CMS ids)
//! - Contentful-shaped entries and their field values
//! - Receipt stamps for ordering inbound field updates
//! - Field update events (the unit of work of the update queue)
//! - Formatting helpers used by preview chrome
//!
//! Rendering concerns (panels, forms, styling) live outside the core.

mod entry;
mod event;
pub mod format;
mod ids;
mod timestamp;

pub use entry::{ContentTypeLink, Entry, EntrySys, FieldKind, FieldValue, Fields, Link, LinkSys};
pub use event::{FieldDeltas, FieldUpdateEvent};
pub use ids::EntryId;
pub use timestamp::{ReceiptClock, ReceiptStamp};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid entry id: {0:?}")]
    InvalidId(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("revision of entry {0} cannot advance")]
    RevisionOverflow(EntryId),
}
