//! Application setup and server configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, StatusCode,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put, MethodRouter},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::{AppEnv, Config};
use crate::kernel::{BaseEventRunner, BaseRecordStore, ServerDeps};
use crate::server::middleware::{require_user, Authorizer, DEV_API_KEY_HEADER};
use crate::server::routes::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub record_store: Arc<dyn BaseRecordStore>,
    pub event_runner: Arc<dyn BaseEventRunner>,
}

/// The part of [`Config`] the router needs.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub app_env: AppEnv,
    pub dev_api_key: String,
    pub allowed_origins: Vec<String>,
    pub request_timeout: Duration,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            app_env: AppEnv::Production,
            dev_api_key: "dev-secret".to_string(),
            allowed_origins: vec![
                "http://127.0.0.1:5173".to_string(),
                "http://localhost:5173".to_string(),
            ],
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&Config> for AppSettings {
    fn from(config: &Config) -> Self {
        Self {
            app_env: config.app_env,
            dev_api_key: config.dev_api_key.clone(),
            allowed_origins: config.allowed_origins.clone(),
            request_timeout: config.request_timeout,
        }
    }
}

/// Register `handler` at `path` and at `path/`.
fn route_both(router: Router, path: &str, handler: MethodRouter) -> Router {
    router
        .route(path, handler.clone())
        .route(&format!("{}/", path), handler)
}

/// Routes that require an authenticated caller.
fn protected_routes() -> Router {
    let mut router = Router::new();

    // Campaigns
    router = route_both(
        router,
        "/campaigns",
        get(list_campaigns).post(create_campaign),
    );
    router = route_both(
        router,
        "/campaigns/:id",
        get(get_campaign)
            .patch(update_campaign)
            .delete(delete_campaign),
    );

    // Email servers
    router = route_both(
        router,
        "/email-servers",
        get(list_email_servers).post(create_email_server),
    );
    router = route_both(
        router,
        "/email-servers/:id",
        put(update_email_server).delete(delete_email_server),
    );

    // Leads
    router = route_both(router, "/leads", get(list_leads).post(lead_not_implemented));
    router = route_both(
        router,
        "/leads/:id",
        get(lead_not_implemented)
            .patch(lead_not_implemented)
            .delete(lead_not_implemented),
    );

    // Senders
    router = route_both(
        router,
        "/senders",
        get(list_senders).post(sender_not_implemented),
    );
    router = route_both(
        router,
        "/senders/:id",
        get(sender_not_implemented)
            .patch(sender_not_implemented)
            .delete(sender_not_implemented),
    );

    // Settings
    router = route_both(
        router,
        "/settings",
        get(get_settings).patch(update_settings_not_implemented),
    );

    // Templates
    router = route_both(
        router,
        "/templates",
        get(list_templates).post(create_template),
    );
    router = route_both(
        router,
        "/templates/:id",
        get(get_template)
            .put(update_template)
            .delete(delete_template),
    );
    router = route_both(router, "/templates/:id/preview", get(preview_template));
    route_both(
        router,
        "/templates/:id/sequence",
        get(get_template_sequence).post(save_template_sequence),
    )
}

/// Routes anyone may call.
fn public_routes() -> Router {
    let router = Router::new().route("/", get(root_handler));
    let router = route_both(router, "/health", get(health_handler));
    route_both(router, "/webhooks/email/event", post(email_event_webhook))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static(DEV_API_KEY_HEADER),
        ])
}

/// `TimeoutLayer` answers with an empty 408; give it the usual JSON error body.
async fn timeout_as_json(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return (
            StatusCode::REQUEST_TIMEOUT,
            Json(json!({ "error": "Request timed out" })),
        )
            .into_response();
    }
    response
}

/// Build the Axum application router
pub fn build_app(deps: ServerDeps, settings: &AppSettings) -> Router {
    let authorizer = Arc::new(Authorizer::from_deps(
        settings.app_env,
        settings.dev_api_key.clone(),
        &deps,
    ));

    let app_state = AppState {
        record_store: deps.record_store.clone(),
        event_runner: deps.event_runner.clone(),
    };

    let protected = protected_routes().route_layer(middleware::from_fn(move |req, next| {
        require_user(authorizer.clone(), req, next)
    }));

    public_routes()
        .merge(protected)
        .fallback(not_found_handler)
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(app_state))
        .layer(TimeoutLayer::new(settings.request_timeout))
        .layer(middleware::map_response(timeout_as_json))
        .layer(cors_layer(&settings.allowed_origins))
        .layer(TraceLayer::new_for_http())
}
