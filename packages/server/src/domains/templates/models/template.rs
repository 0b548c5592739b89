use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::{PageRequest, StoreError};

/// Email template, scoped to the user who created it.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub html: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape of the template list: no body, just its length.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct TemplateSummary {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub created_at: DateTime<Utc>,
    pub length: i32,
}

impl From<&Template> for TemplateSummary {
    fn from(template: &Template) -> Self {
        Self {
            id: template.id,
            name: template.name.clone(),
            subject: template.subject.clone(),
            created_at: template.created_at,
            length: template.html.chars().count() as i32,
        }
    }
}

/// `GET /templates/:id/preview` payload.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TemplatePreview {
    pub id: Uuid,
    pub html: String,
}

impl From<Template> for TemplatePreview {
    fn from(template: Template) -> Self {
        Self {
            id: template.id,
            html: template.html,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct NewTemplate {
    pub name: String,
    pub subject: String,
    pub html: String,
}

/// Body of `PUT /templates/:id`. Absent fields are left untouched.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TemplatePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

impl TemplatePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.subject.is_none() && self.html.is_none()
    }
}

impl Template {
    pub async fn find_page(
        owner: &str,
        page: PageRequest,
        pool: &PgPool,
    ) -> Result<Vec<TemplateSummary>, StoreError> {
        sqlx::query_as::<_, TemplateSummary>(
            "SELECT id, name, subject, created_at, char_length(html) AS length
             FROM templates
             WHERE created_by = $1
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
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM templates WHERE created_by = $1")
            .bind(owner)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_id(id: Uuid, owner: &str, pool: &PgPool) -> Result<Self, StoreError> {
        sqlx::query_as::<_, Self>("SELECT * FROM templates WHERE id = $1 AND created_by = $2")
            .bind(id)
            .bind(owner)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn insert(owner: &str, input: &NewTemplate, pool: &PgPool) -> Result<Self, StoreError> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO templates (name, subject, html, created_by)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&input.name)
        .bind(&input.subject)
        .bind(&input.html)
        .bind(owner)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn update(
        id: Uuid,
        owner: &str,
        patch: &TemplatePatch,
        pool: &PgPool,
    ) -> Result<Self, StoreError> {
        sqlx::query_as::<_, Self>(
            "UPDATE templates
             SET name = COALESCE($3, name),
                 subject = COALESCE($4, subject),
                 html = COALESCE($5, html),
                 updated_at = NOW()
             WHERE id = $1 AND created_by = $2
             RETURNING *",
        )
        .bind(id)
        .bind(owner)
        .bind(&patch.name)
        .bind(&patch.subject)
        .bind(&patch.html)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn delete(id: Uuid, owner: &str, pool: &PgPool) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM templates WHERE id = $1 AND created_by = $2")
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_length_counts_characters_not_bytes() {
        let now = Utc::now();
        let template = Template {
            id: Uuid::new_v4(),
            name: "Welcome".into(),
            subject: "Hallo".into(),
            html: "<p>héllo</p>".into(),
            created_by: "user-1".into(),
            created_at: now,
            updated_at: now,
        };

        let summary = TemplateSummary::from(&template);
        assert_eq!(summary.length, 12);
        assert_eq!(summary.name, "Welcome");
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(TemplatePatch::default().is_empty());
        let patch: TemplatePatch = serde_json::from_str(r#"{"subject": "New"}"#).unwrap();
        assert!(!patch.is_empty());
    }
}
