use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default Gemini API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
/// Default model used for grounded answers.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
/// Default delay between operation status checks.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration passed explicitly into client construction.
#[derive(Clone)]
pub struct Config {
    /// API key sent with every request.
    pub api_key: String,
    /// Base URL of the Gemini API.
    pub base_url: String,
    /// Model identifier used for grounded answers.
    pub model: String,
    /// Delay between operation status checks.
    pub poll_interval: Duration,
    /// Optional cap on status checks before giving up.
    pub max_poll_attempts: Option<u32>,
    /// Optional path for an additional log file.
    pub log_file: Option<PathBuf>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("poll_interval", &self.poll_interval)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field("log_file", &self.log_file)
            .finish()
    }
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup, performing validation along the way.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = optional("GOOGLE_API_KEY")
            .ok_or_else(|| ConfigError::MissingVariable("GOOGLE_API_KEY".to_string()))?;

        let poll_interval_secs = optional("FILE_SEARCH_POLL_INTERVAL_SECS")
            .map(|value| match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Ok(secs),
                _ => Err(ConfigError::InvalidValue(
                    "FILE_SEARCH_POLL_INTERVAL_SECS".to_string(),
                )),
            })
            .transpose()?
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);

        let max_poll_attempts = optional("FILE_SEARCH_MAX_POLL_ATTEMPTS")
            .map(|value| match value.trim().parse::<u32>() {
                Ok(attempts) if attempts > 0 => Ok(attempts),
                _ => Err(ConfigError::InvalidValue(
                    "FILE_SEARCH_MAX_POLL_ATTEMPTS".to_string(),
                )),
            })
            .transpose()?;

        Ok(Self {
            api_key: api_key.trim().to_string(),
            base_url: optional("FILE_SEARCH_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: optional("FILE_SEARCH_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            poll_interval: Duration::from_secs(poll_interval_secs),
            max_poll_attempts,
            log_file: optional("FILE_SEARCH_LOG_FILE").map(PathBuf::from),
        })
    }
}

/// Load `.env` (when present) and read configuration from the environment.
///
/// Nothing is logged here since tracing is installed from the loaded `log_file`.
pub fn load_config() -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    Config::from_env()
}
