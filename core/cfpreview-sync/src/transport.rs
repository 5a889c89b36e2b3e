//! Transport layer abstraction.
//!
//! Defines the cross-origin message channel between the preview and the host
//! window, so the bridge can run against a browser `postMessage` binding, an
//! HTTP relay, or an in-memory mock.

use crate::error::PreviewResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// A message as delivered by the channel, before any validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Origin of the window that posted the message.
    pub origin: String,
    /// Raw payload.
    pub data: serde_json::Value,
}

impl MessageEvent {
    pub fn new(origin: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            origin: origin.into(),
            data,
        }
    }
}

/// Callback invoked for every message arriving on the channel.
pub type MessageHandler = Arc<dyn Fn(&MessageEvent) + Send + Sync>;

/// Handle identifying a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A cross-origin message channel to the host window.
pub trait MessageChannel: Send + Sync {
    /// Registers a listener for inbound messages.
    fn add_listener(&self, handler: MessageHandler) -> ListenerId;

    /// Removes a listener. Returns false if it was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;

    /// Posts a message to the host, restricted to `target_origin`.
    fn post_message(&self, message: &serde_json::Value, target_origin: &str) -> PreviewResult<()>;
}

/// A mock channel for testing.
pub mod mock {
    use super::*;
    use crate::error::PreviewError;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// A message the preview posted to the host.
    #[derive(Debug, Clone, PartialEq)]
    pub struct PostedMessage {
        pub data: serde_json::Value,
        pub target_origin: String,
    }

    impl PostedMessage {
        /// The wire `type` tag, if any.
        pub fn kind(&self) -> Option<&str> {
            self.data.get("type").and_then(|t| t.as_str())
        }
    }

    /// In-memory channel: records posts and delivers scripted host messages.
    #[derive(Default)]
    pub struct MockChannel {
        listeners: Mutex<Vec<(ListenerId, MessageHandler)>>,
        posted: Mutex<Vec<PostedMessage>>,
        fail_sends: AtomicBool,
    }

    impl MockChannel {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Delivers a message to every listener as if posted from `origin`.
        /// Returns the number of listeners invoked.
        pub fn deliver(&self, origin: &str, data: serde_json::Value) -> usize {
            let event = MessageEvent::new(origin, data);
            let handlers: Vec<MessageHandler> =
                self.listeners.lock().iter().map(|(_, h)| h.clone()).collect();
            for handler in &handlers {
                handler(&event);
            }
            handlers.len()
        }

        pub fn listener_count(&self) -> usize {
            self.listeners.lock().len()
        }

        /// All messages posted so far.
        pub fn posted(&self) -> Vec<PostedMessage> {
            self.posted.lock().clone()
        }

        /// Posted messages with the given `type` tag.
        pub fn posted_of_kind(&self, kind: &str) -> Vec<PostedMessage> {
            self.posted
                .lock()
                .iter()
                .filter(|m| m.kind() == Some(kind))
                .cloned()
                .collect()
        }

        /// Drains the posted messages.
        pub fn take_posted(&self) -> Vec<PostedMessage> {
            std::mem::take(&mut *self.posted.lock())
        }

        /// Makes every subsequent post fail, as if the host window were gone.
        pub fn set_fail_sends(&self, fail: bool) {
            self.fail_sends.store(fail, Ordering::SeqCst);
        }
    }

    impl MessageChannel for MockChannel {
        fn add_listener(&self, handler: MessageHandler) -> ListenerId {
            let id = ListenerId::new();
            self.listeners.lock().push((id, handler));
            id
        }

        fn remove_listener(&self, id: ListenerId) -> bool {
            let mut listeners = self.listeners.lock();
            let before = listeners.len();
            listeners.retain(|(lid, _)| *lid != id);
            listeners.len() != before
        }

        fn post_message(
            &self,
            message: &serde_json::Value,
            target_origin: &str,
        ) -> PreviewResult<()> {
            if self.fail_sends.load(Ordering::SeqCst) {
                return Err(PreviewError::Transport("host window unavailable".into()));
            }
            self.posted.lock().push(PostedMessage {
                data: message.clone(),
                target_origin: target_origin.to_string(),
            });
            Ok(())
        }
    }
}
