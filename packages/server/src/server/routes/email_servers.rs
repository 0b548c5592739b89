use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use super::parse_record_id;
use crate::common::{ApiError, ApiResult, AuthUser};
use crate::domains::email_servers::{EmailServer, EmailServerPatch, NewEmailServer, REQUIRED_FIELDS};
use crate::server::app::AppState;

const NOT_FOUND: &str = "Email server not found";

/// A JSON object with at least one key, or 400 `No data provided`.
fn non_empty_body(payload: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    match payload {
        Ok(Json(body)) if body.as_object().is_some_and(|fields| !fields.is_empty()) => Ok(body),
        _ => Err(ApiError::bad_request("No data provided")),
    }
}

/// `GET /email-servers` - the caller's servers, oldest first
pub async fn list_email_servers(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<EmailServer>>> {
    let servers = state
        .record_store
        .list_email_servers(&user.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to retrieve email servers"))?;

    Ok(Json(servers))
}

/// `POST /email-servers`
pub async fn create_email_server(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<EmailServer>)> {
    let body = non_empty_body(payload)?;

    for field in REQUIRED_FIELDS {
        let present = body
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|value| !value.trim().is_empty());
        if !present {
            return Err(ApiError::bad_request(format!("Missing required field: {}", field)));
        }
    }

    let input: NewEmailServer = serde_json::from_value(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid email server: {}", e)))?;

    let server = state
        .record_store
        .create_email_server(&user.user_id, input)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create email server"))?;

    info!(
        email_server_id = %server.id,
        owner = %user.user_id,
        is_default = server.is_default,
        "Email server created"
    );
    Ok((StatusCode::CREATED, Json(server)))
}

/// `PUT /email-servers/:id` - replaces only the fields present in the body
pub async fn update_email_server(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<EmailServer>> {
    let body = non_empty_body(payload)?;
    let id = parse_record_id(&id, NOT_FOUND)?;

    let patch: EmailServerPatch = serde_json::from_value(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid email server: {}", e)))?;
    let patch = patch.without_blank_password();
    if patch.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    state
        .record_store
        .update_email_server(&user.user_id, id, patch)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_store(e, NOT_FOUND, "Failed to update email server"))
}

/// `DELETE /email-servers/:id`
pub async fn delete_email_server(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_record_id(&id, NOT_FOUND)?;

    state
        .record_store
        .delete_email_server(&user.user_id, id)
        .await
        .map_err(|e| ApiError::from_store(e, NOT_FOUND, "Failed to delete email server"))?;

    info!(email_server_id = %id, owner = %user.user_id, "Email server deleted");
    Ok(Json(json!({ "message": "Email server deleted successfully" })))
}
