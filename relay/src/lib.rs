//! HTTP relay between a live preview session and a stand-in host.
//!
//! Outside the browser there is no parent window to exchange messages with.
//! The relay plays that role over HTTP: a developer tool or test harness
//! posts host messages to the relay, which hands them to the session's
//! listeners, and collects whatever the session posts back in an outbox.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use cfpreview_sync::scheduler::Scheduler;
use cfpreview_sync::{
    ClickEvent, ListenerId, LivePreviewSession, MessageChannel, MessageEvent, MessageHandler,
    PreviewResult, SessionConfig, SessionMetrics,
};
use cfpreview_types::{Entry, EntryId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A message the session posted to the host.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutboxMessage {
    pub target_origin: String,
    pub data: serde_json::Value,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DeliveryResponse {
    /// Number of session listeners the message was handed to.
    pub listeners: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InspectorResponse {
    pub attributes: std::collections::BTreeMap<String, String>,
    pub html: String,
}

/// Message channel backed by the relay's HTTP endpoints.
#[derive(Default)]
pub struct RelayChannel {
    listeners: Mutex<Vec<(ListenerId, MessageHandler)>>,
    outbox: Mutex<Vec<OutboxMessage>>,
}

impl RelayChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Hands an inbound message to every listener. Returns how many there were.
    pub fn deliver(&self, event: &MessageEvent) -> usize {
        let handlers: Vec<MessageHandler> =
            self.listeners.lock().iter().map(|(_, h)| Arc::clone(h)).collect();
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    /// Removes and returns everything posted so far.
    pub fn take_outbox(&self) -> Vec<OutboxMessage> {
        std::mem::take(&mut *self.outbox.lock())
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl MessageChannel for RelayChannel {
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

    fn post_message(&self, message: &serde_json::Value, target_origin: &str) -> PreviewResult<()> {
        self.outbox.lock().push(OutboxMessage {
            target_origin: target_origin.to_string(),
            data: message.clone(),
        });
        Ok(())
    }
}

/// Session and channel shared by the HTTP handlers.
pub struct RelayState {
    pub session: Arc<LivePreviewSession>,
    pub channel: Arc<RelayChannel>,
}

impl RelayState {
    /// Connects a new session to a fresh relay channel.
    pub fn connect(config: SessionConfig, scheduler: Arc<dyn Scheduler>) -> PreviewResult<Arc<Self>> {
        let channel = RelayChannel::new();
        let session = LivePreviewSession::connect(config, channel.clone(), scheduler)?;
        Ok(Arc::new(Self { session, channel }))
    }
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

async fn post_message_handler(
    State(state): State<Arc<RelayState>>,
    Json(event): Json<MessageEvent>,
) -> (StatusCode, Json<DeliveryResponse>) {
    debug!("Relaying message from {}", event.origin);
    let listeners = state.channel.deliver(&event);
    (StatusCode::ACCEPTED, Json(DeliveryResponse { listeners }))
}

async fn outbox_handler(State(state): State<Arc<RelayState>>) -> Json<Vec<OutboxMessage>> {
    Json(state.channel.take_outbox())
}

async fn get_entry_handler(
    State(state): State<Arc<RelayState>>,
    Path(id): Path<String>,
) -> Response {
    match state.session.entry(&EntryId::new(id.as_str())) {
        Some(entry) => Json((*entry).clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, format!("entry {id} is not cached")),
    }
}

async fn put_entry_handler(
    State(state): State<Arc<RelayState>>,
    Path(id): Path<String>,
    Json(entry): Json<Entry>,
) -> Response {
    if entry.id().as_str() != id {
        return error(
            StatusCode::BAD_REQUEST,
            format!("path id {id} does not match entry id {}", entry.id()),
        );
    }
    let snapshot = state.session.update_entry(entry);
    Json((*snapshot).clone()).into_response()
}

async fn metrics_handler(State(state): State<Arc<RelayState>>) -> Json<SessionMetrics> {
    Json(state.session.metrics())
}

#[derive(Deserialize)]
struct LocaleQuery {
    locale: Option<String>,
}

async fn inspector_handler(
    State(state): State<Arc<RelayState>>,
    Path((entry_id, field_id)): Path<(String, String)>,
    Query(query): Query<LocaleQuery>,
) -> Json<InspectorResponse> {
    let props = state.session.inspector_props(
        &EntryId::new(entry_id),
        &field_id,
        query.locale.as_deref(),
    );
    Json(InspectorResponse {
        attributes: props
            .attributes()
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
        html: props.to_html_attributes(),
    })
}

async fn inspector_click_handler(
    State(state): State<Arc<RelayState>>,
    Path((entry_id, field_id)): Path<(String, String)>,
    Query(query): Query<LocaleQuery>,
) -> Response {
    let props = state.session.inspector_props(
        &EntryId::new(entry_id),
        &field_id,
        query.locale.as_deref(),
    );
    match props.on_click() {
        Some(handler) if handler.click(&mut ClickEvent::default()) => {
            StatusCode::ACCEPTED.into_response()
        }
        Some(_) => error(StatusCode::BAD_GATEWAY, "host did not accept the request"),
        None => error(StatusCode::CONFLICT, "inspector mode is disabled"),
    }
}

/// Build the HTTP API router for a relayed session.
pub fn build_router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route("/api/v1/messages", post(post_message_handler))
        .route("/api/v1/outbox", get(outbox_handler))
        .route("/api/v1/entries/{id}", get(get_entry_handler).put(put_entry_handler))
        .route("/api/v1/metrics", get(metrics_handler))
        .route("/api/v1/inspector/{entry_id}/{field_id}", get(inspector_handler))
        .route(
            "/api/v1/inspector/{entry_id}/{field_id}/click",
            post(inspector_click_handler),
        )
        .with_state(state)
}
