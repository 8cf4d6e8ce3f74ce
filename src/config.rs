//! Process configuration
//!
//! Loaded once at startup and passed explicitly to the components that need
//! it. Nothing below the binaries reads the environment.

use std::path::PathBuf;
use std::time::Duration;

use tracing::error;

use crate::error::AssistantError;
use crate::Result;

pub const DEFAULT_MODEL: &str = "llama3-groq-70b-8192-tool-use-preview";
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MARKET_DATA_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_PORT: u16 = 7860;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub groq_api_key: String,
    pub groq_model: String,
    pub groq_base_url: String,
    pub market_data_base_url: String,
    pub port: u16,
    pub http_timeout: Duration,
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let groq_api_key = var("GROQ_API_KEY").ok_or_else(|| {
            error!("GROQ_API_KEY environment variable not set");
            AssistantError::ConfigurationError(
                "GROQ_API_KEY environment variable not set".to_string(),
            )
        })?;

        let port = match var("PORT").or_else(|| var("API_PORT")) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                AssistantError::ConfigurationError(format!("Invalid port '{}': {}", raw, e))
            })?,
            None => DEFAULT_PORT,
        };

        let timeout_secs = match var("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                AssistantError::ConfigurationError(format!(
                    "Invalid HTTP_TIMEOUT_SECS '{}': {}",
                    raw, e
                ))
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            groq_api_key: groq_api_key.trim().to_string(),
            groq_model: var("GROQ_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            groq_base_url: var("GROQ_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            market_data_base_url: var("MARKET_DATA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_MARKET_DATA_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            port,
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Log directory. Read on its own so logging is up before the
    /// credential check runs.
    pub fn log_dir_from_env() -> PathBuf {
        dotenv::dotenv().ok();
        std::env::var("LOG_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
