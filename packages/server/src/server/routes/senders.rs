use axum::extract::Extension;
use axum::Json;

use crate::common::{ApiError, ApiResult, AuthUser};
use crate::domains::senders::Sender;
use crate::server::app::AppState;

/// `GET /senders`
pub async fn list_senders(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Sender>>> {
    state
        .record_store
        .list_senders(&user.user_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal(e, "Failed to retrieve senders"))
}

pub async fn sender_not_implemented() -> ApiError {
    ApiError::NotImplemented
}
