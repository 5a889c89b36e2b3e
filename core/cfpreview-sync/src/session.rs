//! Live preview session.
//!
//! The session owns the snapshot cache, subscription registry, update batcher
//! and transport bridge, and is the entry point for the rest of the
//! application. One session per process is expected; [`SessionSlot`] is the
//! caller-owned place that enforces it.

use crate::batcher::{DrainReport, UpdateBatcher};
use crate::bridge::TransportBridge;
use crate::config::SessionConfig;
use crate::error::{PreviewResult, SubscriberResult};
use crate::hub::{SnapshotHub, Subscription};
use crate::inspector::{InspectorProps, InspectorProvider};
use crate::metrics::{Counters, SessionMetrics};
use crate::scheduler::Scheduler;
use crate::transport::MessageChannel;
use cfpreview_types::{Entry, EntryId, FieldUpdateEvent};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub struct LivePreviewSession {
    config: SessionConfig,
    counters: Arc<Counters>,
    hub: Arc<SnapshotHub>,
    batcher: Arc<UpdateBatcher>,
    bridge: Option<Arc<TransportBridge>>,
    inspector: InspectorProvider,
    shut_down: AtomicBool,
}

impl LivePreviewSession {
    /// Creates a session connected to the host through `channel`.
    ///
    /// Fails only on invalid configuration.
    pub fn connect(
        config: SessionConfig,
        channel: Arc<dyn MessageChannel>,
        scheduler: Arc<dyn Scheduler>,
    ) -> PreviewResult<Arc<Self>> {
        config.validate()?;
        Ok(Self::build(config, Some(channel), scheduler))
    }

    /// Creates a session with no host connection.
    ///
    /// Live updates and inspector mode are unavailable; the local cache and
    /// subscriptions still work, so previews render from fetched snapshots.
    pub fn offline(config: SessionConfig, scheduler: Arc<dyn Scheduler>) -> Arc<Self> {
        let config = config.with_live_updates(false);
        Self::build(config, None, scheduler)
    }

    fn build(
        config: SessionConfig,
        channel: Option<Arc<dyn MessageChannel>>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Arc<Self> {
        let counters = Arc::new(Counters::new());
        let hub = SnapshotHub::new(Arc::clone(&counters));
        let batcher = UpdateBatcher::new(
            Arc::clone(&hub),
            scheduler,
            Arc::clone(&counters),
            config.timing(),
        );
        let bridge = channel.map(|channel| {
            Arc::new(TransportBridge::open(
                channel,
                &config,
                &hub,
                &batcher,
                Arc::clone(&counters),
            ))
        });
        let inspector = InspectorProvider::new(&config, bridge.as_ref());

        info!(
            "Live preview session started (locale {}, live updates {}, inspector {})",
            config.locale,
            bridge.is_some() && config.enable_live_updates,
            inspector.is_enabled()
        );

        Arc::new(Self {
            config,
            counters,
            hub,
            batcher,
            bridge,
            inspector,
            shut_down: AtomicBool::new(false),
        })
    }

    /// Subscribes to snapshots of an entry.
    ///
    /// The callback is invoked right away with the cached snapshot, if any,
    /// and then once per applied update until unsubscribed. After shutdown
    /// the callback is never registered and the returned handle is inert.
    pub fn subscribe<F>(&self, entry_id: impl Into<EntryId>, callback: F) -> Subscription
    where
        F: Fn(&Entry) -> SubscriberResult + Send + Sync + 'static,
    {
        let entry_id = entry_id.into();
        if self.is_shut_down() {
            warn!("Ignoring subscription to entry {} on a shut down session", entry_id);
            return Subscription::detached(entry_id);
        }
        self.hub.subscribe(entry_id, Arc::new(callback))
    }

    /// Installs a complete snapshot (e.g. freshly fetched from the CMS) and
    /// notifies subscribers.
    ///
    /// After shutdown the snapshot is returned without being cached.
    pub fn update_entry(&self, entry: Entry) -> Arc<Entry> {
        if self.is_shut_down() {
            warn!("Ignoring update of entry {} on a shut down session", entry.id());
            return Arc::new(entry);
        }
        self.hub.put(entry)
    }

    /// Current snapshot of an entry.
    pub fn entry(&self, entry_id: &EntryId) -> Option<Arc<Entry>> {
        self.hub.get(entry_id)
    }

    /// Queues a field edit as if it had arrived from the host.
    pub fn enqueue_field_update(&self, event: FieldUpdateEvent) {
        self.batcher.enqueue(event);
    }

    /// Runs a drain cycle now instead of waiting for the scheduler.
    pub fn flush(&self) -> DrainReport {
        self.batcher.drain()
    }

    /// Inspector props for a field.
    pub fn inspector_props(
        &self,
        entry_id: &EntryId,
        field_id: &str,
        locale: Option<&str>,
    ) -> InspectorProps {
        self.inspector.props(entry_id, field_id, locale)
    }

    pub fn metrics(&self) -> SessionMetrics {
        SessionMetrics {
            subscribed_entries: self.hub.subscribed_entries(),
            cached_entries: self.hub.cached_entries(),
            queued_updates: self.batcher.queued(),
            is_processing: self.batcher.is_processing(),
            dropped_messages: self.counters.dropped_messages(),
            dropped_updates: self.counters.dropped_updates(),
            failed_sends: self.counters.failed_sends(),
            failed_callbacks: self.counters.failed_callbacks(),
            drain_cycles: self.counters.drain_cycles(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether host edits currently flow into the preview.
    pub fn is_live(&self) -> bool {
        self.config.enable_live_updates
            && self.bridge.as_ref().is_some_and(|b| !b.is_closed())
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Tears down the bridge and drops every snapshot and subscription.
    ///
    /// Edits already queued still drain; with the cache cleared they find no
    /// snapshot and are dropped. Safe to call more than once; returns true
    /// only for the call that did the work.
    pub fn shutdown(&self) -> bool {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(bridge) = &self.bridge {
            bridge.teardown();
        }
        self.hub.clear();
        info!("Live preview session shut down");
        true
    }
}

/// Holder for the process's single session.
#[derive(Default)]
pub struct SessionSlot {
    session: Mutex<Option<Arc<LivePreviewSession>>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the running session, creating it on first call.
    ///
    /// A later call with a different configuration does not reconfigure the
    /// running session; it returns it unchanged. Invalid configuration yields
    /// an offline session instead of an error.
    pub fn initialize(
        &self,
        config: SessionConfig,
        channel: Arc<dyn MessageChannel>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Arc<LivePreviewSession> {
        let mut slot = self.session.lock();
        if let Some(existing) = slot.as_ref() {
            if existing.config() != &config {
                warn!("Live preview session already initialized; ignoring new configuration");
            }
            return Arc::clone(existing);
        }

        let session = match LivePreviewSession::connect(config.clone(), channel, Arc::clone(&scheduler)) {
            Ok(session) => session,
            Err(e) => {
                warn!("Live preview disabled: {}", e);
                LivePreviewSession::offline(config, scheduler)
            }
        };
        *slot = Some(Arc::clone(&session));
        session
    }

    pub fn get(&self) -> Option<Arc<LivePreviewSession>> {
        self.session.lock().clone()
    }

    /// Shuts down and releases the session. Returns false if there was none.
    pub fn shutdown(&self) -> bool {
        match self.session.lock().take() {
            Some(session) => {
                session.shutdown();
                true
            }
            None => false,
        }
    }
}
