//! Shared test helpers for live preview tests.

#![allow(dead_code)]

use cfpreview_sync::scheduler::ManualScheduler;
use cfpreview_sync::transport::mock::MockChannel;
use cfpreview_sync::{LivePreviewSession, SessionConfig, SubscriberResult};
use cfpreview_types::Entry;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

pub const ORIGIN: &str = "https://app.contentful.com";
pub const LOCALE: &str = "en-US";

/// A session wired to a mock host window and a fake clock.
pub struct Harness {
    pub session: Arc<LivePreviewSession>,
    pub channel: Arc<MockChannel>,
    pub scheduler: Arc<ManualScheduler>,
}

pub fn config() -> SessionConfig {
    SessionConfig::new(LOCALE, ORIGIN)
}

pub fn harness() -> Harness {
    harness_with(config())
}

/// Routes log output to the test harness; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn harness_with(config: SessionConfig) -> Harness {
    init_tracing();
    let channel = MockChannel::new();
    let scheduler = ManualScheduler::new();
    let session = LivePreviewSession::connect(config, channel.clone(), scheduler.clone()).unwrap();
    Harness {
        session,
        channel,
        scheduler,
    }
}

pub fn blog_post(id: &str, title: &str) -> Entry {
    Entry::new(id, "blogPost").with_field("title", title)
}

/// Host message for a field edit.
pub fn field_update(entry_id: &str, field_id: &str, value: Value) -> Value {
    json!({
        "type": "CONTENTFUL_FIELD_UPDATE",
        "entryId": entry_id,
        "fieldId": field_id,
        "locale": LOCALE,
        "value": value,
    })
}

/// Host message replacing a whole entry.
pub fn entry_update(entry: &Entry) -> Value {
    json!({
        "type": "CONTENTFUL_ENTRY_UPDATE",
        "entryId": entry.id(),
        "entry": entry,
    })
}

/// Records every snapshot a subscriber receives.
#[derive(Clone, Default)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<Entry>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self) -> impl Fn(&Entry) -> SubscriberResult + Send + Sync + use<> {
        let seen = Arc::clone(&self.seen);
        move |entry: &Entry| {
            seen.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }

    pub fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn snapshots(&self) -> Vec<Entry> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Entry> {
        self.seen.lock().unwrap().last().cloned()
    }
}
