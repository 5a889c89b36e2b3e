use cfpreview_types::{Entry, Error, FieldDeltas, FieldKind, FieldUpdateEvent, Link};
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

fn blog_post() -> Entry {
    Entry::new("e1", "blogPost")
        .with_field("title", "A")
        .with_field("tags", json!(["rust", "cms"]))
}

// ── Construction ─────────────────────────────────────────────────

#[test]
fn new_entry_starts_at_revision_one() {
    let entry = blog_post();
    assert_eq!(entry.revision(), 1);
    assert_eq!(entry.id().as_str(), "e1");
    assert_eq!(entry.content_type_id(), "blogPost");
    assert_eq!(entry.field_str("title"), Some("A"));
    assert_eq!(entry.sys.created_at, entry.sys.updated_at);
}

#[test]
fn parses_contentful_shape() {
    let raw = r#"{
        "sys": {
            "id": "5KsDBWseXY6QegucYAoacS",
            "type": "Entry",
            "contentType": { "sys": { "type": "Link", "linkType": "ContentType", "id": "author" } },
            "createdAt": "2024-01-15T10:00:00.000Z",
            "updatedAt": "2024-01-16T10:00:00.000Z",
            "revision": 4,
            "locale": "en-US"
        },
        "fields": { "name": "Ada" }
    }"#;

    let entry = Entry::from_json(raw).unwrap();
    assert_eq!(entry.id().as_str(), "5KsDBWseXY6QegucYAoacS");
    assert_eq!(entry.content_type_id(), "author");
    assert_eq!(entry.revision(), 4);
    assert_eq!(entry.sys.locale.as_deref(), Some("en-US"));
    assert_eq!(entry.field_str("name"), Some("Ada"));
}

#[test]
fn serializes_camel_case_sys() {
    let value = serde_json::to_value(blog_post()).unwrap();
    assert_eq!(value["sys"]["contentType"]["sys"]["linkType"], "ContentType");
    assert_eq!(value["sys"]["contentType"]["sys"]["type"], "Link");
    assert!(value["sys"].get("updatedAt").is_some());
    assert!(value["sys"].get("locale").is_none());
}

#[test]
fn from_json_rejects_garbage() {
    assert!(Entry::from_json("{not json").is_err());
}

// ── Merging ──────────────────────────────────────────────────────

#[test]
fn merged_bumps_revision_and_overrides_fields() {
    let entry = blog_post();
    let deltas = FieldDeltas::new().with("title", "B").with("slug", "b");

    let merged = entry.merged(&deltas, Utc::now()).unwrap();

    assert_eq!(merged.revision(), 2);
    assert_eq!(merged.field_str("title"), Some("B"));
    assert_eq!(merged.field_str("slug"), Some("b"));
    assert_eq!(merged.field("tags"), entry.field("tags"));
    assert_eq!(merged.sys.created_at, entry.sys.created_at);
}

#[test]
fn merged_with_empty_deltas_still_advances_revision() {
    let entry = blog_post();
    let merged = entry.merged(&FieldDeltas::new(), Utc::now()).unwrap();
    assert_eq!(merged.revision(), 2);
    assert_eq!(merged.fields, entry.fields);
}

#[test]
fn merged_replaces_structured_fields_wholesale() {
    let entry = Entry::new("e1", "author").with_field("social", json!({"twitter": "@a", "github": "a"}));
    let deltas = FieldDeltas::new().with("social", json!({"twitter": "@b"}));

    let merged = entry.merged(&deltas, Utc::now()).unwrap();
    assert_eq!(merged.field("social"), Some(&json!({"twitter": "@b"})));
}

#[test]
fn merged_never_moves_updated_at_backwards() {
    let entry = blog_post();
    let earlier = entry.sys.updated_at - Duration::hours(1);
    let merged = entry.merged(&FieldDeltas::new().with("title", "B"), earlier).unwrap();
    assert_eq!(merged.sys.updated_at, entry.sys.updated_at);
}

#[test]
fn merged_refuses_to_wrap_revision() {
    let entry = blog_post().with_revision(u64::MAX);

    let err = entry.merged(&FieldDeltas::new().with("title", "B"), Utc::now()).unwrap_err();

    assert!(matches!(err, Error::RevisionOverflow(ref id) if id.as_str() == "e1"));
    assert_eq!(entry.revision(), u64::MAX);
    assert_eq!(entry.field_str("title"), Some("A"));
}

// ── Deltas ───────────────────────────────────────────────────────

#[test]
fn deltas_keep_last_value_per_field() {
    let events = vec![
        FieldUpdateEvent::new("e1", "title", "en-US", "B"),
        FieldUpdateEvent::new("e1", "slug", "en-US", "b"),
        FieldUpdateEvent::new("e1", "title", "en-US", "C"),
    ];

    let deltas = FieldDeltas::from_events(&events);
    assert_eq!(deltas.len(), 2);
    assert_eq!(deltas.get("title"), Some(&json!("C")));
    assert_eq!(deltas.get("slug"), Some(&json!("b")));
}

// ── FieldKind ────────────────────────────────────────────────────

#[test]
fn field_kind_classification() {
    assert_eq!(FieldKind::of(&json!("x")), FieldKind::Text);
    assert_eq!(FieldKind::of(&json!(1.5)), FieldKind::Number);
    assert_eq!(FieldKind::of(&json!(true)), FieldKind::Boolean);
    assert_eq!(FieldKind::of(&json!(["a"])), FieldKind::List);
    assert_eq!(FieldKind::of(&json!(null)), FieldKind::Null);
    assert_eq!(FieldKind::of(&json!({"twitter": "@a"})), FieldKind::Object);

    let link = serde_json::to_value(Link::new("Entry", "author-1")).unwrap();
    assert_eq!(FieldKind::of(&link), FieldKind::Reference);
}
