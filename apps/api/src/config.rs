use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_CLUSTER_MODEL: &str = "gpt-3.5-turbo-16k";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Application configuration loaded from environment variables.
/// Fails at startup if `DATABASE_URL` is missing or a numeric value is malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Oracle credential. Without it only stored results can be served.
    pub oracle_api_key: Option<String>,
    pub oracle_model: String,
    pub oracle_cluster_model: String,
    pub oracle_base_url: String,
    pub oracle_call_delay_ms: u64,
    pub app_id: Option<String>,
    pub review_source_url: Option<String>,
    pub days_to_scrape: u32,
    pub max_reviews: usize,
    pub workflows_dir: PathBuf,
    pub export_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            oracle_api_key: optional_env("OPENAI_API_KEY"),
            oracle_model: env_or("ORACLE_MODEL", DEFAULT_MODEL),
            oracle_cluster_model: env_or("ORACLE_CLUSTER_MODEL", DEFAULT_CLUSTER_MODEL),
            oracle_base_url: env_or("ORACLE_BASE_URL", DEFAULT_BASE_URL),
            oracle_call_delay_ms: parse_env("ORACLE_CALL_DELAY_MS", 500)?,
            app_id: optional_env("APP_ID"),
            review_source_url: optional_env("REVIEW_SOURCE_URL"),
            days_to_scrape: parse_env("DAYS_TO_SCRAPE", 7)?,
            max_reviews: parse_env("MAX_REVIEWS", 50)?,
            workflows_dir: env_or("WORKFLOWS_DIR", "workflows").into(),
            export_dir: env_or("EXPORT_DIR", "exports").into(),
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    pub fn call_delay(&self) -> Duration {
        Duration::from_millis(self.oracle_call_delay_ms)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank values are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Defaults for tests; no credential, no source.
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/triage_test".to_string(),
            oracle_api_key: None,
            oracle_model: DEFAULT_MODEL.to_string(),
            oracle_cluster_model: DEFAULT_CLUSTER_MODEL.to_string(),
            oracle_base_url: DEFAULT_BASE_URL.to_string(),
            oracle_call_delay_ms: 0,
            app_id: None,
            review_source_url: None,
            days_to_scrape: 7,
            max_reviews: 50,
            workflows_dir: "workflows".into(),
            export_dir: "exports".into(),
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}
