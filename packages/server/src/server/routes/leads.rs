use axum::extract::{rejection::QueryRejection, Extension, Query};
use axum::Json;
use serde::Serialize;

use crate::common::{ApiError, ApiResult, AuthUser, PageSizeQuery};
use crate::domains::leads::Lead;
use crate::server::app::AppState;

#[derive(Serialize)]
pub struct LeadPage {
    pub items: Vec<Lead>,
    pub page: i64,
    pub size: i64,
    pub total: i64,
}

/// `GET /leads?page=&size=`
///
/// Unparsable query values fall back to the defaults.
pub async fn list_leads(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<PageSizeQuery>, QueryRejection>,
) -> ApiResult<Json<LeadPage>> {
    let page = query.map(|Query(q)| q).unwrap_or_default().resolve();

    let (items, total) = state
        .record_store
        .list_leads(&user.user_id, page)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to retrieve leads"))?;

    Ok(Json(LeadPage {
        items,
        page: page.page,
        size: page.per_page,
        total,
    }))
}

/// Lead writes and single-lead reads are not available yet.
pub async fn lead_not_implemented() -> ApiError {
    ApiError::NotImplemented
}
