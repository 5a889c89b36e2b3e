//! Live preview synchronization for cfpreview.
//!
//! A preview page runs inside the CMS editor's iframe. While an author types,
//! the editor streams field-level edits to the preview over a cross-origin
//! message channel; this crate turns that stream into fresh entry snapshots
//! for every view showing the entry.
//!
//! # Architecture
//!
//! ## Components
//!
//! - **Cache**: last known snapshot per entry
//! - **Registry**: view callbacks per entry
//! - **Hub**: cache writes and subscriber notification as one step
//! - **Batcher**: queues edits and coalesces them per entry in drain cycles
//! - **Scheduler**: defers drain cycles (tokio in production, a fake clock in tests)
//! - **Bridge**: origin-checked listener and sender on the message channel
//! - **Inspector**: click-to-edit attributes that round-trip to the host
//! - **Session**: owns all of the above
//!
//! ## Update flow
//!
//! 1. **Receive**: the bridge accepts a message from the trusted origin
//! 2. **Queue**: field edits are stamped and queued
//! 3. **Drain**: a scheduled cycle folds queued edits into per-entry deltas
//! 4. **Merge**: each delta produces the entry's next revision
//! 5. **Notify**: subscribers receive the new snapshot
//!
//! # Example
//!
//! ```
//! use cfpreview_sync::scheduler::ManualScheduler;
//! use cfpreview_sync::transport::mock::MockChannel;
//! use cfpreview_sync::{LivePreviewSession, SessionConfig};
//! use cfpreview_types::Entry;
//!
//! let scheduler = ManualScheduler::new();
//! let channel = MockChannel::new();
//! let session = LivePreviewSession::connect(
//!     SessionConfig::new("en-US", "https://app.contentful.com"),
//!     channel,
//!     scheduler.clone(),
//! )
//! .unwrap();
//!
//! session.update_entry(Entry::new("e1", "blogPost").with_field("title", "Hello"));
//! let _subscription = session.subscribe("e1", |entry| {
//!     println!("revision {}", entry.revision());
//!     Ok(())
//! });
//! ```

pub mod batcher;
pub mod bridge;
pub mod cache;
pub mod config;
mod error;
pub mod hub;
pub mod inspector;
pub mod metrics;
pub mod protocol;
pub mod registry;
pub mod scheduler;
mod session;
pub mod transport;

pub use batcher::{BatchTiming, DrainReport, UpdateBatcher};
pub use bridge::TransportBridge;
pub use cache::SnapshotCache;
pub use config::{SessionConfig, CONTENTFUL_APP_ORIGIN};
pub use error::{PreviewError, PreviewResult, SubscriberError, SubscriberResult};
pub use hub::{SnapshotHub, Subscription};
pub use inspector::{ClickEvent, InspectorClickHandler, InspectorEvent, InspectorProps};
pub use metrics::SessionMetrics;
pub use protocol::{
    Capabilities, EntryUpdateMessage, FieldUpdateMessage, InboundMessage, OpenFieldEditorMessage,
    OutboundMessage, PreviewReadyMessage,
};
pub use registry::{DeliveryReport, SubscriberFn, SubscriptionId, SubscriptionRegistry};
pub use scheduler::{ManualScheduler, Scheduler, TokioScheduler};
pub use session::{LivePreviewSession, SessionSlot};
pub use transport::{ListenerId, MessageChannel, MessageEvent, MessageHandler};
