//! Client configuration.
//!
//! Loaded via the `config` crate from `EMI_PORTAL_*` environment variables.
//! Nested keys use `__`, e.g. `EMI_PORTAL_NAVIGATION__LOGIN_PATH`.

use std::path::PathBuf;
use std::time::Duration;

use emi_portal_session::RedirectConfig;
use serde::Deserialize;

const ENV_PREFIX: &str = "EMI_PORTAL";

/// Configuration for the command-line client.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the loan-servicing backend, e.g. `http://localhost:5000/api`.
    pub api_base_url: String,

    /// Directory holding the persisted session.
    /// Default: ".emi-portal"
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Per-request timeout, in seconds.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Redirect targets.
    #[serde(default)]
    pub navigation: RedirectConfig,
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".emi-portal")
}

fn default_request_timeout_seconds() -> u64 {
    30
}

impl ClientConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `EMI_PORTAL_API_BASE_URL` is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::load(environment())
    }

    fn load(source: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
