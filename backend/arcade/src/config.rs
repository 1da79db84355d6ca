//! Application configuration loaded from environment variables.

use tracing::warn;

use crate::errors::{AppError, Result};

/// Signing secret used when `ALLOW_DEV_SECRET=1` and no `SCORE_SECRET` is set.
/// Anyone can forge scores against a server running with this key.
pub const DEV_SECRET: &str = "dev-secret";

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Supabase-compatible storage service
    pub storage_url: String,
    /// API key sent to the storage service, if it requires one
    pub storage_key: Option<String>,
    /// Bucket holding the sprite and background images
    pub storage_bucket: String,
    /// Object prefix for sprite images (e.g. `sprite/`)
    pub sprites_prefix: String,
    /// Object prefix for background images (e.g. `Backgrounds/`)
    pub backgrounds_prefix: String,
    /// HMAC key for play tokens
    pub score_secret: String,
    /// Path to the SQLite database file
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// Timeout applied to outbound storage requests
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            storage_url: env_var("STORAGE_URL")
                .map_err(|_| {
                    AppError::Config("STORAGE_URL environment variable is required".to_string())
                })?
                .trim_end_matches('/')
                .to_string(),
            storage_key: env_var("STORAGE_KEY").ok().filter(|k| !k.is_empty()),
            storage_bucket: env_var("STORAGE_BUCKET").unwrap_or_else(|_| "game-assets".to_string()),
            sprites_prefix: env_var("SPRITES_PREFIX").unwrap_or_else(|_| "sprite/".to_string()),
            backgrounds_prefix: env_var("BACKGROUNDS_PREFIX")
                .unwrap_or_else(|_| "Backgrounds/".to_string()),
            score_secret: resolve_secret(
                env_var("SCORE_SECRET").ok(),
                env_flag("ALLOW_DEV_SECRET"),
            )?,
            database_url: env_var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./arcade_scores.db".to_string()),
            api_port: env_var("API_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .map_err(|_| AppError::Config("Invalid API_PORT".to_string()))?,
            http_timeout_secs: env_var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| AppError::Config("Invalid HTTP_TIMEOUT_SECS".to_string()))?,
        })
    }
}

/// Pick the signing secret. A missing or empty secret is a startup fault
/// unless the operator explicitly opted into the dev secret.
fn resolve_secret(secret: Option<String>, allow_dev: bool) -> Result<String> {
    match secret.filter(|s| !s.is_empty()) {
        Some(s) => Ok(s),
        None if allow_dev => {
            warn!("SCORE_SECRET is not set; ALLOW_DEV_SECRET=1 so the public dev secret is in use. Leaderboard scores can be forged!");
            Ok(DEV_SECRET.to_string())
        }
        None => Err(AppError::Config(
            "SCORE_SECRET environment variable is required (set ALLOW_DEV_SECRET=1 to run with the insecure dev secret)"
                .to_string(),
        )),
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| AppError::Config(format!("Missing env var: {key}")))
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
