//! Test harness driving the full router in-process.
//!
//! Every collaborator is an in-memory double from `kernel::test_dependencies`,
//! so no database, provider or network is needed. Requests go through
//! `tower::ServiceExt::oneshot` exactly as the server would handle them.

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use server_core::config::AppEnv;
use server_core::kernel::test_dependencies::{
    InMemoryRecordStore, MockFallbackVerifier, MockTokenVerifier, SpyEventRunner,
    TestDependencies,
};
use server_core::server::{build_app, AppSettings};
use std::time::Duration;
use tower::ServiceExt;

/// Token the mock provider accepts for [`USER_A`].
pub const TOKEN_A: &str = "token-a";
pub const USER_A: &str = "11111111-1111-1111-1111-111111111111";
/// Token the mock provider accepts for [`USER_B`].
pub const TOKEN_B: &str = "token-b";
pub const USER_B: &str = "22222222-2222-2222-2222-222222222222";

pub struct TestHarness {
    pub deps: TestDependencies,
    pub router: Router,
}

/// Response as seen by the caller.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestHarness {
    /// Production mode, provider knows [`TOKEN_A`] and [`TOKEN_B`].
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::default()
    }

    /// Send a request with optional bearer token and JSON body.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut request = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            request = request.header("authorization", format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send_raw(request.body(body).unwrap()).await
    }

    /// Send a fully built request.
    pub async fn send_raw(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        TestResponse { status, body }
    }

    pub async fn get(&self, path: &str, token: &str) -> TestResponse {
        self.send(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> TestResponse {
        self.send(Method::POST, path, Some(token), Some(body)).await
    }

    /// Post a webhook body as-is, without credentials.
    pub async fn post_webhook(&self, body: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/webhooks/email/event")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send_raw(request).await
    }
}

pub struct TestHarnessBuilder {
    settings: AppSettings,
    store: InMemoryRecordStore,
    provider: MockTokenVerifier,
    fallback: Option<MockFallbackVerifier>,
    runner: SpyEventRunner,
}

impl Default for TestHarnessBuilder {
    fn default() -> Self {
        Self {
            settings: AppSettings::default(),
            store: InMemoryRecordStore::new(),
            provider: MockTokenVerifier::new()
                .with_token(TOKEN_A, USER_A)
                .with_token(TOKEN_B, USER_B),
            fallback: None,
            runner: SpyEventRunner::new(),
        }
    }
}

impl TestHarnessBuilder {
    pub fn development(mut self) -> Self {
        self.settings.app_env = AppEnv::Development;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.settings.request_timeout = timeout;
        self
    }

    pub fn store(mut self, store: InMemoryRecordStore) -> Self {
        self.store = store;
        self
    }

    pub fn provider(mut self, provider: MockTokenVerifier) -> Self {
        self.provider = provider;
        self
    }

    pub fn fallback(mut self, fallback: MockFallbackVerifier) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn runner(mut self, runner: SpyEventRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn build(self) -> TestHarness {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let mut deps = TestDependencies::new()
            .with_store(self.store)
            .with_token_verifier(self.provider)
            .with_event_runner(self.runner);
        if let Some(fallback) = self.fallback {
            deps = deps.with_fallback_verifier(fallback);
        }

        let router = build_app(deps.server_deps(), &self.settings);
        TestHarness { deps, router }
    }
}
