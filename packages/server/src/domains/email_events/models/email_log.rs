use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::StoreError;

/// Delivery state of a sent email (`email_status` enum in Postgres).
#[derive(sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "email_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EmailStatus {
    Pending,
    Sent,
    Bounced,
    Opened,
    Clicked,
    Replied,
}

/// Change applied to one `email_log` row by an event handler.
/// `None` leaves the stored column as it is.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailLogUpdate {
    pub status: EmailStatus,
    pub clicked_url: Option<String>,
    pub clicked_at: Option<DateTime<Utc>>,
    pub reply_content: Option<String>,
    pub replied_at: Option<DateTime<Utc>>,
}

impl EmailLogUpdate {
    pub fn status(status: EmailStatus) -> Self {
        Self {
            status,
            clicked_url: None,
            clicked_at: None,
            reply_content: None,
            replied_at: None,
        }
    }
}

pub struct EmailLog;

impl EmailLog {
    /// Apply `update` to the row with `id = email_id`.
    ///
    /// Returns `StoreError::NotFound` when no row matched.
    pub async fn apply_update(
        email_id: &str,
        update: &EmailLogUpdate,
        pool: &PgPool,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE email_log
             SET status = $2,
                 clicked_url = COALESCE($3, clicked_url),
                 clicked_at = COALESCE($4, clicked_at),
                 reply_content = COALESCE($5, reply_content),
                 replied_at = COALESCE($6, replied_at)
             WHERE id::text = $1",
        )
        .bind(email_id)
        .bind(update.status)
        .bind(&update.clicked_url)
        .bind(update.clicked_at)
        .bind(&update.reply_content)
        .bind(update.replied_at)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
