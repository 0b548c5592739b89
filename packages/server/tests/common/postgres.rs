//! Shared Postgres container for tests that exercise `PostgresRecordStore`.
//!
//! The container is started and migrated once per test binary, then reused.
//! Each test connects its own pool and works under fresh owner ids, so tests
//! never see each other's rows.

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

struct SharedPostgres {
    db_url: String,
    // Keep the container alive for the whole test run
    _postgres: ContainerAsync<Postgres>,
}

/// `None` once startup has failed, so later tests skip without retrying.
static SHARED_POSTGRES: OnceCell<Option<SharedPostgres>> = OnceCell::const_new();

impl SharedPostgres {
    async fn init() -> Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let host = postgres.get_host().await?;
        let port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;
        pool.close().await;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }
}

/// Per-test handle on the shared database.
pub struct PostgresHarness {
    pub pool: PgPool,
}

impl PostgresHarness {
    /// Connect to the shared container, starting it on first use.
    ///
    /// Returns `None` when no container runtime is reachable; callers skip.
    pub async fn start() -> Option<Self> {
        let shared = SHARED_POSTGRES
            .get_or_init(|| async {
                match SharedPostgres::init().await {
                    Ok(shared) => Some(shared),
                    Err(e) => {
                        eprintln!("skipping Postgres tests, container unavailable: {:#}", e);
                        None
                    }
                }
            })
            .await
            .as_ref()?;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&shared.db_url)
            .await
            .expect("Failed to connect to shared Postgres");
        Some(Self { pool })
    }

    /// An owner id no other test uses.
    pub fn fresh_owner() -> String {
        format!("owner-{}", Uuid::new_v4())
    }
}
