use axum::{body::Bytes, extract::Extension, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::common::ApiResult;
use crate::domains::email_events::EmailEvent;
use crate::server::app::AppState;

/// `POST /webhooks/email/event`
///
/// Validates the notification, hands it to the event runner and answers 202
/// without waiting for processing. Unauthenticated: the email provider calls
/// this directly.
pub async fn email_event_webhook(
    Extension(state): Extension<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let event = EmailEvent::from_payload(&body)?;
    let kind = event.kind();
    let email_id = event.email_id().to_string();

    info!(
        kind = %kind,
        email_id = %email_id,
        runner = state.event_runner.name(),
        "Dispatching email event"
    );

    if let Err(e) = state.event_runner.enqueue(event).await {
        error!(kind = %kind, email_id = %email_id, error = %e, "Failed to enqueue email event");
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "success",
            "message": format!("Event {} for email {} queued for processing", kind, email_id),
        })),
    ))
}
