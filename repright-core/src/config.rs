//! Connection settings for the Workout API.

use std::env;
use std::time::Duration;

use log::debug;
use reqwest::Url;

use crate::error::{Result, SessionError};

pub const API_URL_VAR: &str = "REPRIGHT_API_URL";
pub const API_TIMEOUT_VAR: &str = "REPRIGHT_API_TIMEOUT_SECS";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl ApiConfig {
    /// Parses `base_url`, accepting only http(s). A trailing slash is added so
    /// endpoint paths join under any prefix (`http://host/api` -> `/api/start_workout`).
    pub fn new(base_url: &str) -> Result<Self> {
        let trimmed = base_url.trim();
        let normalized = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{}/", trimmed)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| SessionError::Config(format!("invalid API url {:?}: {}", trimmed, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(SessionError::Config(format!(
                "unsupported API url scheme {:?}",
                base_url.scheme()
            )));
        }
        Ok(Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Rejects a zero timeout, which would fail every request immediately.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.timeout = timeout;
        self.validate()?;
        Ok(self)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(SessionError::Config(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_env() -> Result<Self> {
        let url = env::var(API_URL_VAR)
            .map_err(|_| SessionError::Config(format!("{} must be set", API_URL_VAR)))?;
        let mut config = Self::new(&url)?;
        if let Ok(raw) = env::var(API_TIMEOUT_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                SessionError::Config(format!("{} must be whole seconds, got {:?}", API_TIMEOUT_VAR, raw))
            })?;
            config = config.with_timeout(Duration::from_secs(secs))?;
        }
        debug!(
            "Loaded API config from env: base_url={} timeout={:?}",
            config.base_url, config.timeout
        );
        Ok(config)
    }

    pub(crate) fn endpoint_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| SessionError::Config(format!("cannot join {:?}: {}", path, e)))
    }
}
