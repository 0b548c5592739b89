use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::StoreError;

/// Fields a create body must carry as non-empty strings, in the order they
/// are reported.
pub const REQUIRED_FIELDS: [&str; 4] = ["email_address", "password", "pop_imap_server", "smtp_server"];

pub const DEFAULT_SMTP_PORT: i32 = 587;

/// Mail server credentials for one sending address.
///
/// The password is stored but never serialized back to callers.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct EmailServer {
    pub id: Uuid,
    pub owner: String,
    pub email_address: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub pop_imap_server: String,
    pub smtp_server: String,
    pub smtp_port: i32,
    pub use_ssl: bool,
    pub use_tls: bool,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_smtp_port() -> i32 {
    DEFAULT_SMTP_PORT
}

fn enabled() -> bool {
    true
}

/// Body of `POST /email-servers`.
#[derive(Deserialize, Debug, Clone)]
pub struct NewEmailServer {
    pub email_address: String,
    pub password: String,
    pub pop_imap_server: String,
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: i32,
    #[serde(default = "enabled")]
    pub use_ssl: bool,
    #[serde(default = "enabled")]
    pub use_tls: bool,
    #[serde(default)]
    pub is_default: bool,
}

/// Body of `PUT /email-servers/:id`. Absent fields are left untouched.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct EmailServerPatch {
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub pop_imap_server: Option<String>,
    #[serde(default)]
    pub smtp_server: Option<String>,
    #[serde(default)]
    pub smtp_port: Option<i32>,
    #[serde(default)]
    pub use_ssl: Option<bool>,
    #[serde(default)]
    pub use_tls: Option<bool>,
    #[serde(default)]
    pub is_default: Option<bool>,
}

impl EmailServerPatch {
    /// Edit forms send the password back blank when it was not changed.
    pub fn without_blank_password(mut self) -> Self {
        if self.password.as_deref().is_some_and(|p| p.trim().is_empty()) {
            self.password = None;
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.email_address.is_none()
            && self.password.is_none()
            && self.pop_imap_server.is_none()
            && self.smtp_server.is_none()
            && self.smtp_port.is_none()
            && self.use_ssl.is_none()
            && self.use_tls.is_none()
            && self.is_default.is_none()
    }

    pub fn makes_default(&self) -> bool {
        self.is_default == Some(true)
    }
}

impl EmailServer {
    /// Servers owned by `owner`, oldest first
    pub async fn find_by_owner(owner: &str, pool: &PgPool) -> Result<Vec<Self>, StoreError> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM email_servers WHERE owner = $1 ORDER BY created_at ASC",
        )
        .bind(owner)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Insert a server. A new default demotes the owner's previous default
    /// in the same transaction.
    pub async fn insert(owner: &str, input: &NewEmailServer, pool: &PgPool) -> Result<Self, StoreError> {
        let mut tx = pool.begin().await?;

        if input.is_default {
            sqlx::query("UPDATE email_servers SET is_default = false WHERE owner = $1 AND is_default")
                .bind(owner)
                .execute(&mut *tx)
                .await?;
        }

        let server = sqlx::query_as::<_, Self>(
            "INSERT INTO email_servers
                (owner, email_address, password, pop_imap_server, smtp_server,
                 smtp_port, use_ssl, use_tls, is_default)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING *",
        )
        .bind(owner)
        .bind(&input.email_address)
        .bind(&input.password)
        .bind(&input.pop_imap_server)
        .bind(&input.smtp_server)
        .bind(input.smtp_port)
        .bind(input.use_ssl)
        .bind(input.use_tls)
        .bind(input.is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(server)
    }

    /// Partial update. Rolls back the default demotion when the server is
    /// absent or not owned.
    pub async fn update(
        id: Uuid,
        owner: &str,
        patch: &EmailServerPatch,
        pool: &PgPool,
    ) -> Result<Self, StoreError> {
        let mut tx = pool.begin().await?;

        if patch.makes_default() {
            sqlx::query(
                "UPDATE email_servers SET is_default = false
                 WHERE owner = $1 AND id <> $2 AND is_default",
            )
            .bind(owner)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        let server = sqlx::query_as::<_, Self>(
            "UPDATE email_servers
             SET email_address = COALESCE($3, email_address),
                 password = COALESCE($4, password),
                 pop_imap_server = COALESCE($5, pop_imap_server),
                 smtp_server = COALESCE($6, smtp_server),
                 smtp_port = COALESCE($7, smtp_port),
                 use_ssl = COALESCE($8, use_ssl),
                 use_tls = COALESCE($9, use_tls),
                 is_default = COALESCE($10, is_default),
                 updated_at = NOW()
             WHERE id = $1 AND owner = $2
             RETURNING *",
        )
        .bind(id)
        .bind(owner)
        .bind(&patch.email_address)
        .bind(&patch.password)
        .bind(&patch.pop_imap_server)
        .bind(&patch.smtp_server)
        .bind(patch.smtp_port)
        .bind(patch.use_ssl)
        .bind(patch.use_tls)
        .bind(patch.is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(server)
    }

    pub async fn delete(id: Uuid, owner: &str, pool: &PgPool) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM email_servers WHERE id = $1 AND owner = $2")
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
