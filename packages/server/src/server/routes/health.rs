use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;
use std::time::Duration;
use tracing::error;

use crate::server::app::AppState;

const STORE_PING_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    database: DatabaseHealth,
    event_runner: String,
}

#[derive(Serialize)]
pub struct DatabaseHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint
///
/// Checks:
/// - Record store connectivity and responsiveness
/// - Which event runner is installed
///
/// Returns 200 OK if the store answers, 503 Service Unavailable otherwise.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let db_health = match tokio::time::timeout(STORE_PING_TIMEOUT, state.record_store.ping()).await
    {
        Ok(Ok(())) => DatabaseHealth {
            status: "ok".to_string(),
            error: None,
        },
        Ok(Err(e)) => {
            error!(error = %e, "Health check store ping failed");
            DatabaseHealth {
                status: "error".to_string(),
                error: Some("Query failed".to_string()),
            }
        }
        Err(_) => DatabaseHealth {
            status: "error".to_string(),
            error: Some("Query timeout (>5s)".to_string()),
        },
    };

    let is_healthy = db_health.status == "ok";

    let overall_status = if is_healthy {
        "healthy"
    } else {
        "unhealthy"
    };

    let status_code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: overall_status.to_string(),
            database: db_health,
            event_runner: state.event_runner.name().to_string(),
        }),
    )
}
