use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Deployment mode. Only `Development` honors the dev API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppEnv::Development => "development",
            AppEnv::Production => "production",
        }
    }
}

impl FromStr for AppEnv {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(AppEnv::Development),
            "production" | "prod" => Ok(AppEnv::Production),
            other => bail!("unknown APP_ENV '{}', expected development or production", other),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub app_env: AppEnv,
    pub database_url: String,
    pub database_max_connections: u32,
    pub run_migrations: bool,
    pub supabase_url: Option<String>,
    pub supabase_service_role_key: Option<String>,
    pub supabase_jwt_secret: Option<String>,
    pub supabase_timeout: Duration,
    pub dev_api_key: String,
    pub allowed_origins: Vec<String>,
    pub email_event_workers: usize,
    pub email_event_queue_capacity: usize,
    pub request_timeout: Duration,
}

const DEFAULT_ALLOWED_ORIGINS: &str = "http://127.0.0.1:5173,http://localhost:5173";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            port: parse_var("PORT", 8080)?,
            app_env: env::var("APP_ENV")
                .unwrap_or_else(|_| "production".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
            run_migrations: parse_var("RUN_MIGRATIONS", false)?,
            supabase_url: non_empty_var("SUPABASE_URL"),
            supabase_service_role_key: non_empty_var("SUPABASE_SERVICE_ROLE_KEY"),
            supabase_jwt_secret: non_empty_var("SUPABASE_JWT_SECRET"),
            supabase_timeout: Duration::from_secs(parse_var("SUPABASE_TIMEOUT_SECS", 10)?),
            dev_api_key: env::var("DEV_API_KEY").unwrap_or_else(|_| "dev-secret".to_string()),
            allowed_origins: parse_origins(
                &env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string()),
            ),
            email_event_workers: parse_var("EMAIL_EVENT_WORKERS", 4)?,
            email_event_queue_capacity: parse_var("EMAIL_EVENT_QUEUE_CAPACITY", 1024)?,
            request_timeout: Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", 30)?),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} must be valid: {}", key, e)),
        Err(_) => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
