//! Configuration for the console and the API client.
//!
//! Values are layered in this order, later sources winning:
//! built-in defaults, an optional TOML file, `REDSOL__*` environment
//! variables, then command-line flags applied by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::request::RetryPolicy;

/// Default file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "redsol.toml";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// A source could not be parsed or deserialized.
    #[error("failed to parse configuration: {0}")]
    ParseError(#[from] config::ConfigError),

    /// A URL setting is not an absolute http(s) URL.
    #[error("invalid URL for {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },

    /// A numeric setting is out of range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// The effective configuration could not be rendered as TOML.
    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Backend endpoints and request policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the main API surface.
    pub base_url: String,
    /// Base URL of the v2 surface (system status, context, insights).
    pub v2_base_url: String,
    /// Deadline for a single attempt, in milliseconds.
    pub timeout_ms: u64,
    /// Attempts per logical call (at least one).
    pub max_retries: u32,
    /// Backoff unit in milliseconds; the wait after attempt n is unit * 2^n.
    pub backoff_base_ms: u64,
    /// Cap on a single backoff wait in milliseconds; absent or 0 means unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_backoff_ms: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            v2_base_url: "http://localhost:8000/api/v2".to_string(),
            timeout_ms: 10_000,
            max_retries: 3,
            backoff_base_ms: 1_000,
            max_backoff_ms: Some(60_000),
        }
    }
}

impl ApiConfig {
    /// Per-attempt deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Retry policy described by the backoff settings.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(self.backoff_base_ms),
            self.max_backoff_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
        )
    }
}

/// Notice display durations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeConfig {
    pub error_display_secs: u64,
    pub success_display_secs: u64,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            error_display_secs: 8,
            success_display_secs: 4,
        }
    }
}

/// Where the client session is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session file path; defaults to the user data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Terminal rendering options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub color: bool,
    pub width: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            color: true,
            width: 72,
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedsolConfig {
    pub api: ApiConfig,
    pub notices: NoticeConfig,
    pub session: SessionConfig,
    pub ui: UiConfig,
}

impl RedsolConfig {
    /// Loads configuration.
    ///
    /// With `path` set, that file must exist. Without it, `redsol.toml` in
    /// the working directory is used if present. Environment variables use
    /// the `REDSOL` prefix and `__` as separator, e.g.
    /// `REDSOL__API__TIMEOUT_MS=5000`.
    ///
    /// Values are not checked here. Callers apply their overrides first and
    /// then call [`RedsolConfig::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::FileNotFound(path.display().to_string()));
                }
                builder = builder.add_source(File::from(path).required(true));
            }
            None => {
                builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false));
            }
        }

        let config = builder
            .add_source(
                Environment::with_prefix("REDSOL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Checks values that deserialization cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("api.base_url", &self.api.base_url),
            ("api.v2_base_url", &self.api.v2_base_url),
        ] {
            let valid = reqwest::Url::parse(value)
                .map(|url| matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base())
                .unwrap_or(false);
            if !valid {
                return Err(ConfigError::InvalidUrl {
                    field,
                    value: value.clone(),
                });
            }
        }
        if self.api.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.api.max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.max_retries",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
