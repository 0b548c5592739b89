//! Integration tests for the request authorizer.
//!
//! Covers every way a request to a protected route can be admitted or
//! turned away, and checks that public routes stay public.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::*;
use serde_json::json;
use server_core::common::{FallbackError, DEV_USER_ID};
use server_core::kernel::test_dependencies::{MockFallbackVerifier, MockTokenVerifier};
use server_core::kernel::BaseRecordStore;
use server_core::domains::campaigns::NewCampaign;

fn with_auth_header(path: &str, value: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header("authorization", value)
        .body(Body::empty())
        .unwrap()
}

fn with_dev_key(method: Method, path: &str, key: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header("x-api-key", key)
        .body(Body::empty())
        .unwrap()
}

// ============================================================================
// Missing and malformed credentials
// ============================================================================

#[tokio::test]
async fn no_credentials_is_authentication_required() {
    let harness = TestHarness::new();

    let res = harness.send(Method::GET, "/campaigns", None, None).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body, json!({ "error": "Authentication required" }));
}

#[tokio::test]
async fn malformed_authorization_headers_are_rejected() {
    let harness = TestHarness::new();

    for value in [TOKEN_A, "Basic dXNlcjpwYXNz", "Bearer", "Bearer a b"] {
        let res = harness.send_raw(with_auth_header("/campaigns", value)).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{value}");
        assert_eq!(
            res.body,
            json!({ "error": "Invalid Authorization header format" })
        );
    }
    assert_eq!(harness.deps.token_verifier.calls(), 0);
}

#[tokio::test]
async fn rejection_happens_before_the_store_is_touched() {
    let harness = TestHarness::new();
    harness.deps.store.set_unavailable(true);

    let res = harness.send(Method::GET, "/leads", None, None).await;

    // A store call would have produced a 500
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Provider verification
// ============================================================================

#[tokio::test]
async fn accepted_token_resolves_to_provider_identity() {
    let harness = TestHarness::new();
    harness
        .deps
        .store
        .create_campaign(
            USER_A,
            NewCampaign {
                name: "Spring".into(),
                description: None,
                template_id: None,
            },
        )
        .await
        .unwrap();

    let res = harness.get("/campaigns", TOKEN_A).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body[0]["owner"], USER_A);
}

#[tokio::test]
async fn lowercase_bearer_scheme_is_accepted() {
    let harness = TestHarness::new();

    let res = harness
        .send_raw(with_auth_header("/campaigns", &format!("bearer {}", TOKEN_A)))
        .await;

    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn token_rejected_by_provider_is_forbidden() {
    let harness = TestHarness::builder()
        .fallback(MockFallbackVerifier::new().with_token("forged", USER_A))
        .build();

    let res = harness.get("/campaigns", "forged").await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body, json!({ "error": "Invalid token" }));
}

// ============================================================================
// Fallback verification
// ============================================================================

#[tokio::test]
async fn unavailable_provider_falls_back_to_local_check() {
    let harness = TestHarness::builder()
        .provider(MockTokenVerifier::unavailable())
        .fallback(MockFallbackVerifier::new().with_token("signed", USER_B))
        .build();

    let res = harness.get("/settings", "signed").await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({}));
}

#[tokio::test]
async fn fallback_outcomes_map_to_statuses() {
    let harness = TestHarness::builder()
        .provider(MockTokenVerifier::unavailable())
        .fallback(
            MockFallbackVerifier::new()
                .with_failure("old", FallbackError::Expired)
                .with_failure("anon", FallbackError::MissingSubject),
        )
        .build();

    let expired = harness.get("/campaigns", "old").await;
    assert_eq!(expired.status, StatusCode::UNAUTHORIZED);
    assert_eq!(expired.body, json!({ "error": "Token has expired" }));

    let anon = harness.get("/campaigns", "anon").await;
    assert_eq!(anon.status, StatusCode::FORBIDDEN);
    assert_eq!(anon.body, json!({ "error": "Invalid token: missing user ID" }));

    let forged = harness.get("/campaigns", "forged").await;
    assert_eq!(forged.status, StatusCode::FORBIDDEN);
    assert_eq!(forged.body, json!({ "error": "Invalid token" }));
}

#[tokio::test]
async fn unavailable_provider_without_fallback_fails_verification() {
    let harness = TestHarness::builder()
        .provider(MockTokenVerifier::unavailable())
        .build();

    let res = harness.get("/campaigns", TOKEN_A).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body, json!({ "error": "Token verification failed" }));
}

#[tokio::test]
async fn misconfigured_fallback_is_the_only_server_error() {
    let harness = TestHarness::builder()
        .provider(MockTokenVerifier::unavailable())
        .fallback(MockFallbackVerifier::misconfigured())
        .build();

    let res = harness.get("/campaigns", TOKEN_A).await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body, json!({ "error": "Authentication failed" }));
}

// ============================================================================
// Development key
// ============================================================================

#[tokio::test]
async fn dev_key_yields_sentinel_identity_in_development() {
    let harness = TestHarness::builder()
        .development()
        .build();
    harness
        .deps
        .store
        .create_campaign(
            DEV_USER_ID,
            NewCampaign {
                name: "Dev".into(),
                description: None,
                template_id: None,
            },
        )
        .await
        .unwrap();

    let res = harness
        .send_raw(with_dev_key(Method::GET, "/campaigns/", "dev-secret"))
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body[0]["owner"], DEV_USER_ID);
    assert_eq!(harness.deps.token_verifier.calls(), 0);
}

#[tokio::test]
async fn dev_key_is_ignored_in_production() {
    let harness = TestHarness::new();

    let res = harness
        .send_raw(with_dev_key(Method::GET, "/campaigns", "dev-secret"))
        .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body, json!({ "error": "Authentication required" }));
}

#[tokio::test]
async fn wrong_dev_key_falls_through_to_bearer() {
    let harness = TestHarness::builder().development().build();

    let request = Request::builder()
        .uri("/campaigns")
        .header("x-api-key", "not-the-key")
        .header("authorization", format!("Bearer {}", TOKEN_A))
        .body(Body::empty())
        .unwrap();
    let res = harness.send_raw(request).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(harness.deps.token_verifier.calls(), 1);
}

// ============================================================================
// Bypasses
// ============================================================================

#[tokio::test]
async fn options_bypasses_authorization() {
    let harness = TestHarness::new();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/campaigns")
        .body(Body::empty())
        .unwrap();
    let res = harness.send_raw(request).await;

    assert_ne!(res.status, StatusCode::UNAUTHORIZED);
    assert_ne!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(harness.deps.token_verifier.calls(), 0);
}

#[tokio::test]
async fn cors_preflight_is_answered_without_credentials() {
    let harness = TestHarness::new();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/templates/")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "authorization,content-type")
        .body(Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(harness.router.clone(), request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-credentials")
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );
}

#[tokio::test]
async fn public_routes_need_no_credentials() {
    let harness = TestHarness::new();

    let root = harness.send(Method::GET, "/", None, None).await;
    assert_eq!(root.status, StatusCode::OK);
    assert_eq!(root.body, json!({ "message": "API is running" }));

    let health = harness.send(Method::GET, "/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "healthy");
    assert_eq!(health.body["event_runner"], "spy");
}
