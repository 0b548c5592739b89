use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::StoreError;

/// Ordered follow-up steps attached to a template. `steps` is opaque JSON
/// owned by the sequence builder UI.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct TemplateSequence {
    pub template_id: Uuid,
    pub steps: Value,
    pub updated_at: DateTime<Utc>,
}

impl TemplateSequence {
    /// Sequence of a template owned by `owner`, if one was saved
    pub async fn find_for_template(
        template_id: Uuid,
        owner: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>, StoreError> {
        sqlx::query_as::<_, Self>(
            "SELECT s.template_id, s.steps, s.updated_at
             FROM template_sequences s
             JOIN templates t ON t.id = s.template_id
             WHERE s.template_id = $1 AND t.created_by = $2",
        )
        .bind(template_id)
        .bind(owner)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Insert or replace the sequence. Callers check template ownership first.
    pub async fn upsert(template_id: Uuid, steps: &Value, pool: &PgPool) -> Result<Self, StoreError> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO template_sequences (template_id, steps, updated_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT (template_id)
             DO UPDATE SET steps = EXCLUDED.steps, updated_at = NOW()
             RETURNING template_id, steps, updated_at",
        )
        .bind(template_id)
        .bind(steps)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }
}
