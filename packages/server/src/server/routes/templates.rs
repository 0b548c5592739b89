use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use super::parse_record_id;
use crate::common::{ApiError, ApiResult, AuthUser, PageLimitQuery};
use crate::domains::templates::{
    NewTemplate, Template, TemplatePatch, TemplatePreview, TemplateSummary,
};
use crate::server::app::AppState;

const NOT_FOUND: &str = "Template not found";

#[derive(Serialize)]
pub struct TemplatePage {
    pub data: Vec<TemplateSummary>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// `GET /templates?page=&limit=` - summaries, newest first
pub async fn list_templates(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<PageLimitQuery>, QueryRejection>,
) -> ApiResult<Json<TemplatePage>> {
    let page = query.map(|Query(q)| q).unwrap_or_default().resolve();

    let (data, total) = state
        .record_store
        .list_templates(&user.user_id, page)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to retrieve templates"))?;

    Ok(Json(TemplatePage {
        data,
        total,
        page: page.page,
        limit: page.per_page,
    }))
}

/// `POST /templates`
pub async fn create_template(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewTemplate>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Template>)> {
    let Json(input) = payload?;
    if input.name.trim().is_empty() {
        return Err(ApiError::bad_request("Template name is required"));
    }

    let template = state
        .record_store
        .create_template(&user.user_id, input)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create template"))?;

    info!(template_id = %template.id, owner = %user.user_id, "Template created");
    Ok((StatusCode::CREATED, Json(template)))
}

/// `GET /templates/:id`
pub async fn get_template(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Template>> {
    let id = parse_record_id(&id, NOT_FOUND)?;

    state
        .record_store
        .find_template(&user.user_id, id)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_store(e, NOT_FOUND, "Failed to retrieve template"))
}

/// `PUT /templates/:id` - replaces only the fields present in the body
pub async fn update_template(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<TemplatePatch>, JsonRejection>,
) -> ApiResult<Json<Template>> {
    let id = parse_record_id(&id, NOT_FOUND)?;
    let Json(patch) = payload?;
    if patch.is_empty() {
        return Err(ApiError::bad_request("No valid fields to update"));
    }

    state
        .record_store
        .update_template(&user.user_id, id, patch)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_store(e, NOT_FOUND, "Failed to update template"))
}

/// `DELETE /templates/:id`
pub async fn delete_template(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_record_id(&id, NOT_FOUND)?;

    state
        .record_store
        .delete_template(&user.user_id, id)
        .await
        .map_err(|e| ApiError::from_store(e, NOT_FOUND, "Failed to delete template"))?;

    info!(template_id = %id, owner = %user.user_id, "Template deleted");
    Ok(Json(json!({ "message": "Template deleted successfully" })))
}

/// `GET /templates/:id/preview`
pub async fn preview_template(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<TemplatePreview>> {
    let id = parse_record_id(&id, NOT_FOUND)?;

    state
        .record_store
        .find_template(&user.user_id, id)
        .await
        .map(|t| Json(TemplatePreview::from(t)))
        .map_err(|e| ApiError::from_store(e, NOT_FOUND, "Failed to retrieve template preview"))
}

/// `GET /templates/:id/sequence` - `{"steps": []}` when nothing is saved
pub async fn get_template_sequence(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let Ok(id) = parse_record_id(&id, NOT_FOUND) else {
        return Ok(Json(json!({ "steps": [] })));
    };

    let sequence = state
        .record_store
        .find_template_sequence(&user.user_id, id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to retrieve template sequence"))?;

    let steps = sequence.map(|s| s.steps).unwrap_or_else(|| json!([]));
    Ok(Json(json!({ "steps": steps })))
}

/// `POST /templates/:id/sequence` - body `{"steps": [...]}`
pub async fn save_template_sequence(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let steps = match payload {
        Ok(Json(mut body)) => body.get_mut("steps").map(Value::take),
        Err(_) => None,
    };
    let Some(steps) = steps.filter(Value::is_array) else {
        return Err(ApiError::bad_request("No steps provided"));
    };
    let id = parse_record_id(&id, NOT_FOUND)?;

    let sequence = state
        .record_store
        .save_template_sequence(&user.user_id, id, steps)
        .await
        .map_err(|e| ApiError::from_store(e, NOT_FOUND, "Failed to save template sequence"))?;

    info!(template_id = %id, owner = %user.user_id, "Template sequence saved");
    Ok(Json(json!({
        "message": "Sequence saved successfully",
        "steps": sequence.steps,
    })))
}
