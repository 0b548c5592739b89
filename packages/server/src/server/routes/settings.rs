use axum::extract::Extension;
use axum::Json;
use serde_json::{json, Value};

use crate::common::{ApiError, ApiResult, AuthUser};
use crate::server::app::AppState;

/// `GET /settings` - the caller's settings document, `{}` when none is stored
pub async fn get_settings(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    let settings = state
        .record_store
        .find_settings(&user.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to retrieve settings"))?;

    Ok(Json(settings.map(|s| s.settings).unwrap_or_else(|| json!({}))))
}

pub async fn update_settings_not_implemented() -> ApiError {
    ApiError::NotImplemented
}
