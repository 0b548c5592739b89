//! Processing functions for email events.
//!
//! These run on the event workers, after the webhook response has been sent.
//! Failures are logged and collapsed to `false`; nobody is waiting for them.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::event::EmailEvent;
use super::models::{EmailLogUpdate, EmailStatus};
use crate::common::StoreError;
use crate::kernel::BaseRecordStore;

/// Route a validated event to its handler.
pub async fn process_email_event(store: &dyn BaseRecordStore, event: &EmailEvent) -> bool {
    match event {
        EmailEvent::Open {
            email_id,
            timestamp,
            metadata,
        } => handle_open_event(store, email_id, *timestamp, metadata.as_ref()).await,
        EmailEvent::Click {
            email_id,
            url,
            timestamp,
            metadata,
        } => handle_click_event(store, email_id, url.as_deref(), *timestamp, metadata.as_ref()).await,
        EmailEvent::Reply {
            email_id,
            content,
            timestamp,
            metadata,
        } => {
            handle_reply_event(store, email_id, content.as_deref(), *timestamp, metadata.as_ref())
                .await
        }
    }
}

/// Mark the email as opened.
pub async fn handle_open_event(
    store: &dyn BaseRecordStore,
    email_id: &str,
    timestamp: Option<DateTime<Utc>>,
    metadata: Option<&Value>,
) -> bool {
    debug!(email_id = %email_id, ?timestamp, ?metadata, "Handling open event");

    let update = EmailLogUpdate::status(EmailStatus::Opened);
    record_outcome("open", email_id, store.update_email_log(email_id, update).await)
}

/// Mark the email as clicked and remember which link.
pub async fn handle_click_event(
    store: &dyn BaseRecordStore,
    email_id: &str,
    url: Option<&str>,
    timestamp: Option<DateTime<Utc>>,
    metadata: Option<&Value>,
) -> bool {
    debug!(email_id = %email_id, url = ?url, ?timestamp, ?metadata, "Handling click event");

    let update = EmailLogUpdate {
        clicked_url: url.map(String::from),
        clicked_at: timestamp,
        ..EmailLogUpdate::status(EmailStatus::Clicked)
    };
    record_outcome("click", email_id, store.update_email_log(email_id, update).await)
}

/// Mark the email as replied and keep the reply body.
pub async fn handle_reply_event(
    store: &dyn BaseRecordStore,
    email_id: &str,
    content: Option<&str>,
    timestamp: Option<DateTime<Utc>>,
    metadata: Option<&Value>,
) -> bool {
    debug!(email_id = %email_id, ?timestamp, ?metadata, "Handling reply event");

    let update = EmailLogUpdate {
        reply_content: content.map(String::from),
        replied_at: timestamp,
        ..EmailLogUpdate::status(EmailStatus::Replied)
    };
    record_outcome("reply", email_id, store.update_email_log(email_id, update).await)
}

fn record_outcome(kind: &str, email_id: &str, result: Result<(), StoreError>) -> bool {
    match result {
        Ok(()) => {
            info!(kind = kind, email_id = %email_id, "Processed email event");
            true
        }
        Err(StoreError::NotFound) => {
            warn!(kind = kind, email_id = %email_id, "Email event for unknown email");
            false
        }
        Err(e) => {
            error!(kind = kind, email_id = %email_id, error = %e, "Error processing email event");
            false
        }
    }
}
