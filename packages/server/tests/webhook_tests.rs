//! Integration tests for the email event webhook.
//!
//! The spy runner records what was handed over, so these tests check
//! validation and dispatch without running any workers.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;
use server_core::domains::email_events::{EmailEvent, EmailEventKind};
use server_core::kernel::test_dependencies::SpyEventRunner;

#[tokio::test]
async fn open_event_is_accepted_and_dispatched_once() {
    let harness = TestHarness::new();

    let res = harness
        .post_webhook(r#"{"event": "open", "email_id": "abc"}"#)
        .await;

    assert_eq!(res.status, StatusCode::ACCEPTED);
    assert_eq!(
        res.body,
        json!({
            "status": "success",
            "message": "Event open for email abc queued for processing",
        })
    );

    let events = harness.deps.event_runner.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), EmailEventKind::Open);
    assert_eq!(events[0].email_id(), "abc");
}

#[tokio::test]
async fn webhook_needs_no_credentials_even_in_production() {
    let harness = TestHarness::new();

    let res = harness
        .post_webhook(r#"{"event": "reply", "email_id": "e-1", "content": "Thanks!"}"#)
        .await;

    assert_eq!(res.status, StatusCode::ACCEPTED);
    assert!(matches!(
        harness.deps.event_runner.events().as_slice(),
        [EmailEvent::Reply { content: Some(c), .. }] if c == "Thanks!"
    ));
}

#[tokio::test]
async fn click_event_carries_url_and_timestamp() {
    let harness = TestHarness::new();

    let res = harness
        .post_webhook(
            r#"{"event": "click", "email_id": "e-2", "url": "https://x.test/offer",
                "timestamp": "2024-05-01T12:00:00Z", "metadata": {"ip": "10.0.0.1"}}"#,
        )
        .await;

    assert_eq!(res.status, StatusCode::ACCEPTED);
    let events = harness.deps.event_runner.events();
    match &events[0] {
        EmailEvent::Click {
            url,
            timestamp,
            metadata,
            ..
        } => {
            assert_eq!(url.as_deref(), Some("https://x.test/offer"));
            assert_eq!(
                timestamp.map(|t| t.to_rfc3339()),
                Some("2024-05-01T12:00:00+00:00".to_string())
            );
            assert_eq!(metadata.as_ref().unwrap()["ip"], "10.0.0.1");
        }
        other => panic!("expected click, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_email_id_is_rejected_without_dispatch() {
    let harness = TestHarness::new();

    let res = harness.post_webhook(r#"{"event": "open"}"#).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, json!({ "error": "Missing required field: email_id" }));
    assert!(harness.deps.event_runner.events().is_empty());
}

#[tokio::test]
async fn missing_both_fields_names_both() {
    let harness = TestHarness::new();

    let res = harness.post_webhook(r#"{"metadata": {}}"#).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.body,
        json!({ "error": "Missing required fields: event, email_id" })
    );
}

#[tokio::test]
async fn unknown_event_kind_is_rejected_without_dispatch() {
    let harness = TestHarness::new();

    let res = harness
        .post_webhook(r#"{"event": "unknown", "email_id": "abc"}"#)
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, json!({ "error": "Unhandled event type: unknown" }));
    assert!(harness.deps.event_runner.events().is_empty());
}

#[tokio::test]
async fn empty_or_invalid_body_has_no_event_data() {
    let harness = TestHarness::new();

    for body in ["", "not json", "[]", "{}", "null"] {
        let res = harness.post_webhook(body).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{body:?}");
        assert_eq!(res.body, json!({ "error": "No event data provided" }));
    }
    assert!(harness.deps.event_runner.events().is_empty());
}

#[tokio::test]
async fn same_payload_twice_is_dispatched_twice() {
    let harness = TestHarness::new();
    let payload = r#"{"event": "open", "email_id": "abc"}"#;

    assert_eq!(harness.post_webhook(payload).await.status, StatusCode::ACCEPTED);
    assert_eq!(harness.post_webhook(payload).await.status, StatusCode::ACCEPTED);

    assert_eq!(harness.deps.event_runner.events().len(), 2);
}

#[tokio::test]
async fn enqueue_failure_still_acknowledges() {
    let harness = TestHarness::builder()
        .runner(SpyEventRunner::failing())
        .build();

    let res = harness
        .post_webhook(r#"{"event": "open", "email_id": "abc"}"#)
        .await;

    assert_eq!(res.status, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn trailing_slash_path_is_accepted() {
    let harness = TestHarness::new();

    let res = harness
        .send(
            axum::http::Method::POST,
            "/webhooks/email/event/",
            None,
            Some(json!({ "event": "open", "email_id": 42 })),
        )
        .await;

    assert_eq!(res.status, StatusCode::ACCEPTED);
    assert_eq!(harness.deps.event_runner.events()[0].email_id(), "42");
}
