use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::common::StoreError;

/// Free-form per-user settings document.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct UserSettings {
    pub user_id: String,
    pub settings: Value,
    pub updated_at: DateTime<Utc>,
}

impl UserSettings {
    pub async fn find_by_user(user_id: &str, pool: &PgPool) -> Result<Option<Self>, StoreError> {
        sqlx::query_as::<_, Self>("SELECT * FROM user_settings WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }
}
