//! Transport bridge between the host window and the session.
//!
//! The bridge owns the session's listener on the message channel. Inbound
//! messages are accepted only from the trusted origin; anything else (other
//! frames, browser extensions, unrelated widgets sharing the channel) is
//! dropped quietly. Field edits go to the batcher, whole-entry replacements go
//! straight to the cache.
//!
//! Outbound messages are posted to the trusted origin only.

use crate::batcher::UpdateBatcher;
use crate::config::SessionConfig;
use crate::hub::SnapshotHub;
use crate::metrics::Counters;
use crate::protocol::{InboundMessage, OutboundMessage, PreviewReadyMessage};
use crate::transport::{ListenerId, MessageChannel, MessageEvent};
use cfpreview_types::FieldUpdateEvent;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, trace, warn};

/// Where accepted inbound messages are routed.
struct InboundRoute {
    trusted_origin: String,
    default_locale: String,
    live_updates: bool,
    hub: Weak<SnapshotHub>,
    batcher: Weak<UpdateBatcher>,
    counters: Arc<Counters>,
    closed: Arc<AtomicBool>,
}

impl InboundRoute {
    fn handle(&self, event: &MessageEvent) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }

        if event.origin != self.trusted_origin {
            trace!("Ignoring message from untrusted origin {}", event.origin);
            self.counters.message_dropped();
            return;
        }

        let message = match InboundMessage::decode(&event.data) {
            Ok(message) => message,
            Err(e) => {
                trace!("Ignoring unrecognized message: {}", e);
                self.counters.message_dropped();
                return;
            }
        };

        trace!("Received {} for entry {}", message.kind(), message.entry_id());

        match message {
            InboundMessage::FieldUpdate(update) => {
                if !self.live_updates {
                    trace!("Live updates disabled, ignoring field update for {}", update.entry_id);
                    return;
                }
                let Some(batcher) = self.batcher.upgrade() else {
                    return;
                };
                let locale = update
                    .locale
                    .unwrap_or_else(|| self.default_locale.clone());
                batcher.enqueue(FieldUpdateEvent::new(
                    update.entry_id,
                    update.field_id,
                    locale,
                    update.value,
                ));
            }
            InboundMessage::EntryUpdate(update) => {
                if update.entry.id() != &update.entry_id {
                    debug!(
                        "Ignoring entry update: envelope id {} does not match entry {}",
                        update.entry_id,
                        update.entry.id()
                    );
                    self.counters.message_dropped();
                    return;
                }
                if let Some(hub) = self.hub.upgrade() {
                    hub.put(update.entry);
                }
            }
        }
    }
}

/// Owned connection to the host window.
pub struct TransportBridge {
    channel: Arc<dyn MessageChannel>,
    trusted_origin: String,
    listener: Mutex<Option<ListenerId>>,
    closed: Arc<AtomicBool>,
    counters: Arc<Counters>,
}

impl TransportBridge {
    /// Starts listening on `channel` and announces the preview to the host.
    pub fn open(
        channel: Arc<dyn MessageChannel>,
        config: &SessionConfig,
        hub: &Arc<SnapshotHub>,
        batcher: &Arc<UpdateBatcher>,
        counters: Arc<Counters>,
    ) -> Self {
        let closed = Arc::new(AtomicBool::new(false));
        let route = InboundRoute {
            trusted_origin: config.target_origin.clone(),
            default_locale: config.locale.clone(),
            live_updates: config.enable_live_updates,
            hub: Arc::downgrade(hub),
            batcher: Arc::downgrade(batcher),
            counters: Arc::clone(&counters),
            closed: Arc::clone(&closed),
        };
        let listener = channel.add_listener(Arc::new(move |event: &MessageEvent| route.handle(event)));

        let bridge = Self {
            channel,
            trusted_origin: config.target_origin.clone(),
            listener: Mutex::new(Some(listener)),
            closed,
            counters,
        };

        info!("Live preview bridge listening for {}", bridge.trusted_origin);
        bridge.send(&OutboundMessage::PreviewReady(PreviewReadyMessage::new(
            config.locale.clone(),
            config.capabilities(),
        )));
        bridge
    }

    /// Posts a message to the host. Failures are logged and counted.
    /// Returns whether the message was handed to the channel.
    pub fn send(&self, message: &OutboundMessage) -> bool {
        if self.is_closed() {
            debug!("Bridge closed, not sending {}", message.kind());
            return false;
        }

        let payload = match message.encode() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to encode {} message: {}", message.kind(), e);
                self.counters.send_failed();
                return false;
            }
        };

        match self.channel.post_message(&payload, &self.trusted_origin) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to send {} to host: {}", message.kind(), e);
                self.counters.send_failed();
                false
            }
        }
    }

    pub fn trusted_origin(&self) -> &str {
        &self.trusted_origin
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Removes the listener. Safe to call more than once; returns true only
    /// for the call that actually tore the bridge down.
    pub fn teardown(&self) -> bool {
        let Some(listener) = self.listener.lock().take() else {
            return false;
        };
        self.closed.store(true, Ordering::Release);
        if !self.channel.remove_listener(listener) {
            debug!("Listener {} was already gone", listener);
        }
        info!("Live preview bridge torn down");
        true
    }
}

impl Drop for TransportBridge {
    fn drop(&mut self) {
        self.teardown();
    }
}
