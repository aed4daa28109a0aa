use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Where wizard drafts and profile auth records are kept.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftBackend {
    File(PathBuf),
    Redis(String),
    Memory,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub draft_backend: DraftBackend,
    pub http_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
    /// Wizard sessions idle for longer than this are dropped.
    pub session_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let draft_backend = match optional_env("DRAFT_BACKEND")
            .unwrap_or_else(|| "file".to_string())
            .as_str()
        {
            "file" => DraftBackend::File(PathBuf::from(
                optional_env("DRAFT_DIR").unwrap_or_else(|| ".drafts".to_string()),
            )),
            "redis" => DraftBackend::Redis(require_env("REDIS_URL")?),
            "memory" => DraftBackend::Memory,
            other => bail!("DRAFT_BACKEND must be one of file, redis, memory (got '{other}')"),
        };

        let http_timeout = seconds("HTTP_TIMEOUT_SECS", optional_env("HTTP_TIMEOUT_SECS"), 30)?;
        let session_ttl = seconds("SESSION_TTL_SECS", optional_env("SESSION_TTL_SECS"), 1800)?;

        Ok(Config {
            api_base_url: require_env("API_BASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            draft_backend,
            http_timeout,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            session_ttl,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// A positive whole number of seconds, or `default` when unset.
fn seconds(key: &str, raw: Option<String>, default: u64) -> Result<Duration> {
    let secs = match raw {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds"))?,
        None => default,
    };
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}
