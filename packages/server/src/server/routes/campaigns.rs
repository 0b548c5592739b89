use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    Json,
};
use tracing::info;

use super::parse_record_id;
use crate::common::{ApiError, ApiResult, AuthUser};
use crate::domains::campaigns::{Campaign, CampaignPatch, NewCampaign};
use crate::server::app::AppState;

const NOT_FOUND: &str = "Campaign not found";

/// `GET /campaigns` - the caller's campaigns, newest first
pub async fn list_campaigns(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Campaign>>> {
    let campaigns = state
        .record_store
        .list_campaigns(&user.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to retrieve campaigns"))?;

    Ok(Json(campaigns))
}

/// `POST /campaigns`
pub async fn create_campaign(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewCampaign>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Campaign>)> {
    let Json(input) = payload?;
    if input.name.trim().is_empty() {
        return Err(ApiError::bad_request("Campaign name is required"));
    }

    let campaign = state
        .record_store
        .create_campaign(&user.user_id, input)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create campaign"))?;

    info!(campaign_id = %campaign.id, owner = %user.user_id, "Campaign created");
    Ok((StatusCode::CREATED, Json(campaign)))
}

/// `GET /campaigns/:id`
pub async fn get_campaign(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Campaign>> {
    let id = parse_record_id(&id, NOT_FOUND)?;

    state
        .record_store
        .find_campaign(&user.user_id, id)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_store(e, NOT_FOUND, "Failed to retrieve campaign"))
}

/// `PATCH /campaigns/:id` - partial update, at least one field
pub async fn update_campaign(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<CampaignPatch>, JsonRejection>,
) -> ApiResult<Json<Campaign>> {
    let id = parse_record_id(&id, NOT_FOUND)?;
    let Json(patch) = payload?;
    if patch.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    state
        .record_store
        .update_campaign(&user.user_id, id, patch)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_store(e, NOT_FOUND, "Failed to update campaign"))
}

/// `DELETE /campaigns/:id`
pub async fn delete_campaign(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_record_id(&id, NOT_FOUND)?;

    state
        .record_store
        .delete_campaign(&user.user_id, id)
        .await
        .map_err(|e| ApiError::from_store(e, NOT_FOUND, "Failed to delete campaign"))?;

    info!(campaign_id = %id, owner = %user.user_id, "Campaign deleted");
    Ok(StatusCode::NO_CONTENT)
}
