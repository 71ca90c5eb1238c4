use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

const MAX_HISTORY_LIMIT: usize = 1000;

/// Application configuration loaded from environment variables.
/// Read once at startup; nothing re-reads the environment afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key. Absent means every generation request falls back to the bank.
    pub gemini_api_key: Option<String>,
    /// Shared secret for the HR review dashboard, which lives outside this service.
    pub hr_password: Option<String>,
    pub data_file: PathBuf,
    pub questions_per_tech: usize,
    pub history_limit: usize,
    pub generation_retries: u32,
    pub generation_retry_delay_ms: u64,
    /// Seconds without a message before a live session is evicted.
    pub session_idle_ttl_secs: u64,
    /// Seconds an ended session stays viewable before it is evicted.
    pub session_ended_grace_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            hr_password: optional_env("HR_PASSWORD"),
            data_file: optional_env("DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("candidate_screenings.json")),
            questions_per_tech: parse_env("QUESTIONS_PER_TECH", 4)?,
            history_limit: parse_env("HISTORY_LIMIT", 10)?,
            generation_retries: parse_env("GENERATION_RETRIES", 3)?,
            generation_retry_delay_ms: parse_env("GENERATION_RETRY_DELAY_MS", 1000)?,
            session_idle_ttl_secs: parse_env("SESSION_IDLE_TTL_SECS", 1800)?,
            session_ended_grace_secs: parse_env("SESSION_ENDED_GRACE_SECS", 300)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.questions_per_tech == 0 {
            bail!("QUESTIONS_PER_TECH must be at least 1");
        }
        if !(2..=MAX_HISTORY_LIMIT).contains(&self.history_limit) {
            bail!("HISTORY_LIMIT must be between 2 and {MAX_HISTORY_LIMIT}");
        }
        if self.generation_retries == 0 {
            bail!("GENERATION_RETRIES must be at least 1");
        }
        if self.session_idle_ttl_secs == 0 {
            bail!("SESSION_IDLE_TTL_SECS must be at least 1");
        }
        Ok(())
    }
}

/// Treats unset and blank variables the same way.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}
