use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::{PageRequest, StoreError};

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Lead {
    pub id: Uuid,
    pub owner: String,
    pub email: String,
    pub company: Option<String>,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    pub async fn find_page(
        owner: &str,
        page: PageRequest,
        pool: &PgPool,
    ) -> Result<Vec<Self>, StoreError> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM leads
             WHERE owner = $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(owner)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn count_by_owner(owner: &str, pool: &PgPool) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM leads WHERE owner = $1")
            .bind(owner)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }
}
