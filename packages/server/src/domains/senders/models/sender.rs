use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::StoreError;

/// Mailbox a campaign sends from.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Sender {
    pub id: Uuid,
    pub owner: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub daily_quota: Option<i32>,
}

impl Sender {
    pub async fn find_by_owner(owner: &str, pool: &PgPool) -> Result<Vec<Self>, StoreError> {
        sqlx::query_as::<_, Self>("SELECT * FROM senders WHERE owner = $1 ORDER BY email")
            .bind(owner)
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }
}
