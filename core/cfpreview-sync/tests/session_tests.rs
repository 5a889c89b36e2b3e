mod common;

use cfpreview_sync::inspector::{ATTR_ENTRY_ID, ATTR_FIELD_ID, ATTR_INSPECTOR, ATTR_LOCALE};
use cfpreview_sync::transport::mock::MockChannel;
use cfpreview_sync::{
    ClickEvent, LivePreviewSession, ManualScheduler, PreviewError, SessionConfig, SessionMetrics,
    SessionSlot, SubscriberResult, TokioScheduler,
};
use cfpreview_types::{Entry, EntryId, FieldUpdateEvent};
use common::{blog_post, config, field_update, harness, harness_with, Recorder, LOCALE, ORIGIN};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn id(s: &str) -> EntryId {
    EntryId::new(s)
}

// ── Live update flow ─────────────────────────────────────────────

#[test]
fn burst_of_edits_yields_one_notification() {
    let h = harness();
    h.session.update_entry(blog_post("e1", "A"));
    let recorder = Recorder::new();
    let _sub = h.session.subscribe("e1", recorder.callback());

    h.channel.deliver(ORIGIN, field_update("e1", "title", json!("B")));
    h.channel.deliver(ORIGIN, field_update("e1", "title", json!("C")));
    h.scheduler.run_pending();

    let snapshot = h.session.entry(&id("e1")).unwrap();
    assert_eq!(snapshot.field_str("title"), Some("C"));
    assert_eq!(snapshot.revision(), 2);
    assert_eq!(recorder.count(), 2);
    assert_eq!(recorder.last().unwrap().field_str("title"), Some("C"));
}

#[test]
fn edit_for_unfetched_entry_is_dropped() {
    let h = harness();
    let recorder = Recorder::new();
    let _sub = h.session.subscribe("e1", recorder.callback());

    h.channel.deliver(ORIGIN, field_update("e1", "title", json!("B")));
    h.scheduler.run_pending();

    assert!(h.session.entry(&id("e1")).is_none());
    assert_eq!(recorder.count(), 0);
    assert_eq!(h.session.metrics().dropped_updates, 1);
}

#[test]
fn unsubscribed_view_stops_receiving() {
    let h = harness();
    h.session.update_entry(blog_post("e1", "A"));
    let kept = Recorder::new();
    let gone = Recorder::new();
    let _keep = h.session.subscribe("e1", kept.callback());
    let sub = h.session.subscribe("e1", gone.callback());

    assert!(sub.unsubscribe());
    h.channel.deliver(ORIGIN, field_update("e1", "title", json!("B")));
    h.scheduler.run_pending();

    assert_eq!(kept.count(), 2);
    assert_eq!(gone.count(), 1);
}

#[test]
fn dropping_subscription_handle_keeps_subscription() {
    let h = harness();
    h.session.update_entry(blog_post("e1", "A"));
    let recorder = Recorder::new();
    drop(h.session.subscribe("e1", recorder.callback()));

    h.session.update_entry(blog_post("e1", "B"));
    assert_eq!(recorder.count(), 2);
    assert_eq!(h.session.metrics().subscribed_entries, 1);
}

#[test]
fn locally_enqueued_edits_follow_same_path() {
    let h = harness();
    h.session.update_entry(blog_post("e1", "A"));

    h.session
        .enqueue_field_update(FieldUpdateEvent::new("e1", "title", LOCALE, "Local"));
    let report = h.session.flush();

    assert_eq!(report.applied, vec![id("e1")]);
    assert_eq!(h.session.entry(&id("e1")).unwrap().field_str("title"), Some("Local"));
}

#[test]
fn failing_subscriber_does_not_block_others() {
    let h = harness();
    h.session.update_entry(blog_post("e1", "A"));
    let recorder = Recorder::new();
    let _bad = h
        .session
        .subscribe("e1", |_: &Entry| -> SubscriberResult { Err("view crashed".into()) });
    let _good = h.session.subscribe("e1", recorder.callback());

    h.channel.deliver(ORIGIN, field_update("e1", "title", json!("B")));
    h.scheduler.run_pending();

    assert_eq!(recorder.last().unwrap().field_str("title"), Some("B"));
    assert_eq!(h.session.metrics().failed_callbacks, 2);
}

#[test]
fn subscriber_may_query_session_while_notified() {
    let h = harness();
    h.session.update_entry(blog_post("e1", "A"));
    h.session.update_entry(blog_post("e2", "Related"));

    let session = Arc::downgrade(&h.session);
    let related = Arc::new(std::sync::Mutex::new(Vec::new()));
    let seen = Arc::clone(&related);
    let _sub = h.session.subscribe("e1", move |_: &Entry| -> SubscriberResult {
        if let Some(session) = session.upgrade() {
            let title = session
                .entry(&EntryId::new("e2"))
                .and_then(|e| e.field_str("title").map(str::to_string));
            seen.lock().unwrap().push(title);
        }
        Ok(())
    });

    h.channel.deliver(ORIGIN, field_update("e1", "title", json!("B")));
    h.scheduler.run_pending();

    assert_eq!(related.lock().unwrap().len(), 2);
}

// ── Shutdown ─────────────────────────────────────────────────────

#[test]
fn shutdown_clears_snapshots_and_subscriptions() {
    let h = harness();
    h.session.update_entry(blog_post("e1", "A"));
    let recorder = Recorder::new();
    let sub = h.session.subscribe("e1", recorder.callback());

    h.session.shutdown();

    let metrics = h.session.metrics();
    assert_eq!(metrics.cached_entries, 0);
    assert_eq!(metrics.subscribed_entries, 0);
    assert!(!sub.unsubscribe());
}

#[test]
fn queued_edits_drain_harmlessly_after_shutdown() {
    let h = harness();
    h.session.update_entry(blog_post("e1", "A"));
    let recorder = Recorder::new();
    let _sub = h.session.subscribe("e1", recorder.callback());
    h.channel.deliver(ORIGIN, field_update("e1", "title", json!("B")));

    h.session.shutdown();
    h.scheduler.run_pending();

    assert_eq!(recorder.count(), 1);
    assert_eq!(h.session.metrics().queued_updates, 0);
    assert_eq!(h.session.metrics().dropped_updates, 1);
}

#[test]
fn shut_down_session_stays_empty() {
    let h = harness();
    h.session.shutdown();

    let recorder = Recorder::new();
    let sub = h.session.subscribe("e1", recorder.callback());
    let snapshot = h.session.update_entry(blog_post("e1", "A"));

    assert_eq!(snapshot.field_str("title"), Some("A"));
    assert!(h.session.entry(&id("e1")).is_none());
    assert_eq!(recorder.count(), 0);
    let metrics = h.session.metrics();
    assert_eq!(metrics.cached_entries, 0);
    assert_eq!(metrics.subscribed_entries, 0);
    assert_eq!(sub.entry_id(), &id("e1"));
    assert!(!sub.unsubscribe());
}

// ── Degraded mode ────────────────────────────────────────────────

#[test]
fn connect_rejects_invalid_config() {
    for bad in [
        SessionConfig::new("", ORIGIN),
        SessionConfig::new(LOCALE, ""),
        SessionConfig::new(LOCALE, "*"),
        SessionConfig::new(LOCALE, "app.contentful.com"),
    ] {
        let result = LivePreviewSession::connect(bad, MockChannel::new(), ManualScheduler::new());
        assert!(matches!(result, Err(PreviewError::InvalidConfig(_))));
    }
}

#[test]
fn offline_session_serves_local_snapshots() {
    let session = LivePreviewSession::offline(config(), ManualScheduler::new());
    let recorder = Recorder::new();
    let _sub = session.subscribe("e1", recorder.callback());

    session.update_entry(blog_post("e1", "A"));

    assert!(!session.is_live());
    assert!(!session.config().enable_live_updates);
    assert_eq!(recorder.count(), 1);
    assert!(session.inspector_props(&id("e1"), "title", None).is_empty());
}

// ── SessionSlot ──────────────────────────────────────────────────

#[test]
fn slot_initializes_once() {
    let slot = SessionSlot::new();
    let channel = MockChannel::new();
    let scheduler = ManualScheduler::new();

    let first = slot.initialize(config(), channel.clone(), scheduler.clone());
    let second = slot.initialize(
        config().with_debug_mode(true),
        channel.clone(),
        scheduler.clone(),
    );

    assert!(Arc::ptr_eq(&first, &second));
    assert!(!second.config().debug_mode);
    assert_eq!(channel.listener_count(), 1);
}

#[test]
fn slot_falls_back_to_offline_on_invalid_config() {
    let slot = SessionSlot::new();
    let channel = MockChannel::new();

    let session = slot.initialize(
        SessionConfig::new(LOCALE, "*"),
        channel.clone(),
        ManualScheduler::new(),
    );

    assert!(!session.is_live());
    assert_eq!(channel.listener_count(), 0);
    assert!(channel.posted().is_empty());
}

#[test]
fn slot_shutdown_allows_reinitialization() {
    let slot = SessionSlot::new();
    let channel = MockChannel::new();
    let scheduler = ManualScheduler::new();

    let first = slot.initialize(config(), channel.clone(), scheduler.clone());
    assert!(slot.shutdown());
    assert!(first.is_shut_down());
    assert!(slot.get().is_none());
    assert!(!slot.shutdown());

    let second = slot.initialize(config(), channel.clone(), scheduler);
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(channel.listener_count(), 1);
}

// ── Inspector ────────────────────────────────────────────────────

#[test]
fn inspector_props_carry_field_coordinates() {
    let h = harness();
    let props = h.session.inspector_props(&id("e1"), "title", None);

    assert_eq!(props.attribute(ATTR_ENTRY_ID), Some("e1"));
    assert_eq!(props.attribute(ATTR_FIELD_ID), Some("title"));
    assert_eq!(props.attribute(ATTR_LOCALE), Some(LOCALE));
    assert_eq!(props.attribute(ATTR_INSPECTOR), Some("true"));
    assert_eq!(props.style().get("cursor").map(String::as_str), Some("pointer"));
    assert_eq!(props.style().get("outline").map(String::as_str), Some("none"));
}

#[test]
fn inspector_debug_mode_outlines_fields() {
    let h = harness_with(config().with_debug_mode(true));
    let props = h.session.inspector_props(&id("e1"), "title", None);
    assert_eq!(
        props.style().get("outline").map(String::as_str),
        Some("1px dashed #3b82f6")
    );
}

#[test]
fn inspector_disabled_yields_empty_props() {
    let h = harness_with(config().with_inspector_mode(false));
    let props = h.session.inspector_props(&id("e1"), "title", None);
    assert!(props.is_empty());
    assert!(props.on_click().is_none());
    assert_eq!(props.to_html_attributes(), "");
}

#[test]
fn inspector_click_consumes_event() {
    let h = harness();
    let props = h.session.inspector_props(&id("e1"), "body", Some("de-DE"));
    let mut event = ClickEvent::default();

    props.on_click().unwrap().click(&mut event);

    assert!(event.default_prevented);
    assert!(event.propagation_stopped);
    assert_eq!(props.on_click().unwrap().target().locale, "de-DE");
}

#[test]
fn inspector_html_attributes_are_escaped() {
    let h = harness();
    let props = h.session.inspector_props(&id("e\"1"), "title", None);
    assert_eq!(
        props.to_html_attributes(),
        "data-contentful-entry-id=\"e&quot;1\" data-contentful-field-id=\"title\" \
         data-contentful-inspector=\"true\" data-contentful-locale=\"en-US\""
    );
}

// ── Metrics ──────────────────────────────────────────────────────

#[test]
fn metrics_snapshot() {
    let h = harness();
    h.session.update_entry(blog_post("e1", "A"));
    h.session.update_entry(blog_post("e2", "B"));
    let _sub = h.session.subscribe("e1", Recorder::new().callback());
    h.channel.deliver(ORIGIN, field_update("e1", "title", json!("C")));
    h.channel.deliver("https://other.example", json!({}));

    assert_eq!(
        h.session.metrics(),
        SessionMetrics {
            subscribed_entries: 1,
            cached_entries: 2,
            queued_updates: 1,
            is_processing: false,
            dropped_messages: 1,
            ..Default::default()
        }
    );

    h.scheduler.run_pending();
    let metrics = h.session.metrics();
    assert_eq!(metrics.queued_updates, 0);
    assert_eq!(metrics.drain_cycles, 1);
}

#[test]
fn metrics_serialize_camel_case() {
    let value = serde_json::to_value(SessionMetrics::default()).unwrap();
    assert!(value.get("subscribedEntries").is_some());
    assert!(value.get("queuedUpdates").is_some());
    assert!(value.get("isProcessing").is_some());
}

// ── Tokio runtime ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn tokio_scheduler_drains_on_runtime() {
    let channel = MockChannel::new();
    let scheduler = Arc::new(TokioScheduler::current().unwrap());
    let session = LivePreviewSession::connect(config(), channel.clone(), scheduler).unwrap();
    session.update_entry(blog_post("e1", "A"));

    channel.deliver(ORIGIN, field_update("e1", "title", json!("B")));
    assert_eq!(session.entry(&id("e1")).unwrap().field_str("title"), Some("A"));

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(session.entry(&id("e1")).unwrap().field_str("title"), Some("B"));
}

#[test]
fn tokio_scheduler_requires_runtime() {
    assert!(matches!(
        TokioScheduler::current(),
        Err(PreviewError::NoRuntime(_))
    ));
}
