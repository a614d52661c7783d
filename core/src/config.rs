//! Transport configuration.
//!
//! A `TransportConfig` can be deserialized from any serde source or read from
//! the environment:
//!
//! - `GITLAB_URL` (required): base URL of the GitLab instance.
//! - `GITLAB_TIMEOUT_SECS` (optional): whole-request timeout in seconds.
//! - `GITLAB_USER_AGENT` (optional): overrides the default user agent.

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use url::Url;

pub const DEFAULT_USER_AGENT: &str = concat!("gitlab-core/", env!("CARGO_PKG_VERSION"));

/// Why a `TransportConfig` could not be built from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid base URL {value:?}: {source}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid timeout {0:?}: expected whole seconds")]
    InvalidTimeout(String),
}

/// Settings for `ReqwestTransport`: where to send requests and how long to wait.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransportConfig {
    pub base_url: Url,
    #[serde(default, rename = "timeout_secs", deserialize_with = "timeout_from_secs")]
    pub timeout: Option<Duration>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl TransportConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: None,
            user_agent: default_user_agent(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, using the same keys as
    /// [`TransportConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("GITLAB_URL").ok_or(ConfigError::Missing("GITLAB_URL"))?;
        let base_url = Url::parse(&raw_url).map_err(|source| ConfigError::InvalidUrl {
            value: raw_url.clone(),
            source,
        })?;

        let mut config = Self::new(base_url);

        if let Some(raw) = lookup("GITLAB_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        if let Some(agent) = lookup("GITLAB_USER_AGENT") {
            config.user_agent = agent;
        }

        Ok(config)
    }
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn timeout_from_secs<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
}
