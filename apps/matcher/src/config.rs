use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::matching::presenter::CategoryOrder;

const DEFAULT_SCORING_SERVICE_URL: &str = "http://localhost:8000";

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub scoring_service_url: String,
    /// Bounded wait applied to the bulk scoring call.
    pub analysis_timeout: Duration,
    /// Transport-level timeout for every request made by the scoring client.
    pub request_timeout: Duration,
    pub top_category_order: CategoryOrder,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let analysis_timeout_secs = parse_env("ANALYSIS_TIMEOUT_SECS", 120u64)?;
        if analysis_timeout_secs == 0 {
            bail!("ANALYSIS_TIMEOUT_SECS must be greater than zero");
        }

        let top_category_order = match optional_env("TOP_CATEGORY_ORDER").as_deref() {
            None | Some("received") => CategoryOrder::Received,
            Some("score") => CategoryOrder::ScoreDescending,
            Some(other) => {
                bail!("TOP_CATEGORY_ORDER must be 'received' or 'score', got '{other}'")
            }
        };

        Ok(Config {
            scoring_service_url: optional_env("SCORING_SERVICE_URL")
                .unwrap_or_else(|| DEFAULT_SCORING_SERVICE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            analysis_timeout: Duration::from_secs(analysis_timeout_secs),
            request_timeout: Duration::from_secs(parse_env("REQUEST_TIMEOUT_SECS", 150u64)?),
            top_category_order,
            port: parse_env("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
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
