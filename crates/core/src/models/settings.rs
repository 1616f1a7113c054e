use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use super::period::TimePeriod;

/// Backend URL used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

const ENV_API_URL: &str = "RATE_WATCH_API_URL";
const ENV_TIMEOUT: &str = "RATE_WATCH_TIMEOUT_SECS";

/// Client configuration. Session-only; nothing is written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the rates REST API (e.g., "http://localhost:8000").
    pub api_base_url: String,

    /// Per-request timeout in seconds (native targets only).
    pub request_timeout_secs: u64,

    /// Chart window selected when the dashboard starts.
    pub default_period: TimePeriod,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 30,
            default_period: TimePeriod::default(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Defaults overridden by `RATE_WATCH_API_URL` and `RATE_WATCH_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, CoreError> {
        let mut settings = Settings::default();
        if let Ok(url) = std::env::var(ENV_API_URL) {
            settings.api_base_url = url;
        }
        if let Ok(raw) = std::env::var(ENV_TIMEOUT) {
            settings.request_timeout_secs = raw.trim().parse().map_err(|_| {
                CoreError::Config(format!("{ENV_TIMEOUT} must be a whole number of seconds, got '{raw}'"))
            })?;
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CoreError::Config(format!(
                "api_base_url must be an http(s) URL, got '{}'",
                self.api_base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Config("request_timeout_secs must be greater than zero".into()));
        }
        Ok(())
    }
}
