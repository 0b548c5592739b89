// Main entry point for API server

use std::sync::Arc;

use anyhow::{Context, Result};
use server_core::domains::auth::JwtService;
use server_core::kernel::{
    BaseEventRunner, BaseFallbackVerifier, EventRunnerConfig, LoggingEventRunner,
    PostgresRecordStore, ServerDeps, SupabaseTokenVerifier, TokioEventRunner,
};
use server_core::server::{build_app, AppSettings};
use server_core::Config;
use sqlx::postgres::PgPoolOptions;
use supabase::{SupabaseClient, SupabaseOptions};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting outreach API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(app_env = config.app_env.as_str(), "Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    if config.run_migrations {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;
        tracing::info!("Migrations complete");
    }

    let record_store = Arc::new(PostgresRecordStore::new(pool));

    // Identity provider
    let supabase = SupabaseClient::new(SupabaseOptions {
        url: config.supabase_url.clone().unwrap_or_default(),
        service_role_key: config.supabase_service_role_key.clone().unwrap_or_default(),
        timeout: config.supabase_timeout,
    });
    if !supabase.is_configured() {
        tracing::warn!("SUPABASE_URL or SUPABASE_SERVICE_ROLE_KEY not set; tokens are checked locally only");
    }
    let token_verifier = Arc::new(SupabaseTokenVerifier::new(Arc::new(supabase)));

    let fallback_verifier = config.supabase_jwt_secret.as_deref().map(|secret| {
        Arc::new(JwtService::new(secret)) as Arc<dyn BaseFallbackVerifier>
    });
    if fallback_verifier.is_none() {
        tracing::warn!("SUPABASE_JWT_SECRET not set; no local token verification fallback");
    }

    // Event runner
    let worker_pool = (config.email_event_workers > 0).then(|| {
        Arc::new(TokioEventRunner::spawn(
            record_store.clone(),
            EventRunnerConfig {
                workers: config.email_event_workers,
                queue_capacity: config.email_event_queue_capacity,
            },
        ))
    });
    let event_runner: Arc<dyn BaseEventRunner> = match &worker_pool {
        Some(pool) => pool.clone() as Arc<dyn BaseEventRunner>,
        None => {
            tracing::warn!("EMAIL_EVENT_WORKERS=0; email events will be logged, not processed");
            Arc::new(LoggingEventRunner)
        }
    };

    let deps = ServerDeps::new(record_store, token_verifier, fallback_verifier, event_runner);
    let app = build_app(deps, &AppSettings::from(&config));

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(pool) = worker_pool {
        pool.shutdown().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
