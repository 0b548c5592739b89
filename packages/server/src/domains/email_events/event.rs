//! Inbound email event notifications.
//!
//! Parsing is the whole validation step: a payload either becomes an
//! [`EmailEvent`] or a 400 explaining what is missing.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::common::ApiError;

/// Closed set of event kinds the webhook accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmailEventKind {
    Open,
    Click,
    Reply,
}

impl EmailEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailEventKind::Open => "open",
            EmailEventKind::Click => "click",
            EmailEventKind::Reply => "reply",
        }
    }
}

impl fmt::Display for EmailEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmailEventKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(EmailEventKind::Open),
            "click" => Ok(EmailEventKind::Click),
            "reply" => Ok(EmailEventKind::Reply),
            other => Err(ApiError::bad_request(format!("Unhandled event type: {}", other))),
        }
    }
}

/// A validated notification, ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum EmailEvent {
    Open {
        email_id: String,
        timestamp: Option<DateTime<Utc>>,
        metadata: Option<Value>,
    },
    Click {
        email_id: String,
        url: Option<String>,
        timestamp: Option<DateTime<Utc>>,
        metadata: Option<Value>,
    },
    Reply {
        email_id: String,
        content: Option<String>,
        timestamp: Option<DateTime<Utc>>,
        metadata: Option<Value>,
    },
}

impl EmailEvent {
    pub fn kind(&self) -> EmailEventKind {
        match self {
            EmailEvent::Open { .. } => EmailEventKind::Open,
            EmailEvent::Click { .. } => EmailEventKind::Click,
            EmailEvent::Reply { .. } => EmailEventKind::Reply,
        }
    }

    pub fn email_id(&self) -> &str {
        match self {
            EmailEvent::Open { email_id, .. }
            | EmailEvent::Click { email_id, .. }
            | EmailEvent::Reply { email_id, .. } => email_id,
        }
    }

    /// Validate a raw webhook body.
    ///
    /// Rejects an empty or non-object body, a missing `event` or `email_id`,
    /// and any event kind outside open/click/reply.
    pub fn from_payload(body: &[u8]) -> Result<Self, ApiError> {
        let payload = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|value| match value {
                Value::Object(map) if !map.is_empty() => Some(map),
                _ => None,
            })
            .ok_or_else(|| ApiError::bad_request("No event data provided"))?;

        let event = payload.get("event").filter(|v| !is_blank(v));
        let email_id = payload.get("email_id").and_then(opaque_id);

        let (event, email_id) = match (event, email_id) {
            (Some(event), Some(email_id)) => (event, email_id),
            (None, Some(_)) => return Err(missing(&["event"])),
            (Some(_), None) => return Err(missing(&["email_id"])),
            (None, None) => return Err(missing(&["event", "email_id"])),
        };

        let kind = match event {
            Value::String(s) => s.parse::<EmailEventKind>()?,
            other => return Err(ApiError::bad_request(format!("Unhandled event type: {}", other))),
        };

        let timestamp = parse_timestamp(&payload, &email_id);
        let metadata = payload.get("metadata").filter(|v| !v.is_null()).cloned();

        Ok(match kind {
            EmailEventKind::Open => EmailEvent::Open {
                email_id,
                timestamp,
                metadata,
            },
            EmailEventKind::Click => EmailEvent::Click {
                email_id,
                url: string_field(&payload, "url"),
                timestamp,
                metadata,
            },
            EmailEventKind::Reply => EmailEvent::Reply {
                email_id,
                content: string_field(&payload, "content"),
                timestamp,
                metadata,
            },
        })
    }
}

fn missing(fields: &[&str]) -> ApiError {
    if fields.len() == 1 {
        ApiError::bad_request(format!("Missing required field: {}", fields[0]))
    } else {
        ApiError::bad_request(format!("Missing required fields: {}", fields.join(", ")))
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Email ids are opaque: accept strings and bare numbers.
fn opaque_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_field(payload: &Map<String, Value>, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(String::from)
}

/// RFC 3339 strings or unix seconds. Anything else is logged and dropped;
/// the event itself is still valid.
fn parse_timestamp(payload: &Map<String, Value>, email_id: &str) -> Option<DateTime<Utc>> {
    let raw = payload.get("timestamp").filter(|v| !v.is_null())?;

    let parsed = match raw {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        _ => None,
    };

    if parsed.is_none() {
        warn!(email_id = %email_id, timestamp = %raw, "Ignoring unparsable event timestamp");
    }
    parsed
}
