use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::StoreError;

/// Campaign model - SQL persistence layer
///
/// Every query is scoped by `owner`; a campaign owned by someone else is
/// indistinguishable from one that does not exist.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner: String,
    pub template_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /campaigns`.
#[derive(Deserialize, Debug, Clone)]
pub struct NewCampaign {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub template_id: Option<Uuid>,
}

/// Body of `PATCH /campaigns/:id`. Absent fields are left untouched.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct CampaignPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub template_id: Option<Uuid>,
}

impl CampaignPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.template_id.is_none()
    }
}

impl Campaign {
    /// Campaigns owned by `owner`, newest first
    pub async fn find_by_owner(owner: &str, pool: &PgPool) -> Result<Vec<Self>, StoreError> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM campaigns WHERE owner = $1 ORDER BY created_at DESC",
        )
        .bind(owner)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: Uuid, owner: &str, pool: &PgPool) -> Result<Self, StoreError> {
        sqlx::query_as::<_, Self>("SELECT * FROM campaigns WHERE id = $1 AND owner = $2")
            .bind(id)
            .bind(owner)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn insert(owner: &str, input: &NewCampaign, pool: &PgPool) -> Result<Self, StoreError> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO campaigns (name, description, template_id, owner)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.template_id)
        .bind(owner)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn update(
        id: Uuid,
        owner: &str,
        patch: &CampaignPatch,
        pool: &PgPool,
    ) -> Result<Self, StoreError> {
        sqlx::query_as::<_, Self>(
            "UPDATE campaigns
             SET name = COALESCE($3, name),
                 description = COALESCE($4, description),
                 template_id = COALESCE($5, template_id),
                 updated_at = NOW()
             WHERE id = $1 AND owner = $2
             RETURNING *",
        )
        .bind(id)
        .bind(owner)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(patch.template_id)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn delete(id: Uuid, owner: &str, pool: &PgPool) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1 AND owner = $2")
            .bind(id)
            .bind(owner)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
