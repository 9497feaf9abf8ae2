//! Configuration loading
//!
//! The API location is injected into every component at construction time.
//! Settings are resolved in priority order:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables
//! 3. TOML config file
//! 4. Built-in defaults (fallback)
//!
//! A missing config file is not an error: a warning is logged and defaults
//! are used. A config file that exists but cannot be parsed is an error.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Environment variable overriding `base_url`
pub const ENV_BASE_URL: &str = "INVESTLINK_BASE_URL";
/// Environment variable overriding `timeout_ms`
pub const ENV_TIMEOUT_MS: &str = "INVESTLINK_TIMEOUT_MS";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server origin, e.g. `http://localhost:8000`
    pub base_url: String,

    /// Path prefix for API routes. Health lives outside it.
    pub api_prefix: String,

    /// Per-request timeout. A timeout counts as a failed fetch or update.
    pub timeout_ms: u64,

    /// Batch size hint sent as `num` on recommendation fetches
    pub batch_size: u32,

    /// `limit` sent on search requests
    pub search_limit: u32,

    /// Delay before a search keystroke is sent to the server
    pub search_debounce_ms: u64,

    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            api_prefix: "/api".to_string(),
            timeout_ms: 10_000,
            batch_size: 5,
            search_limit: 10,
            search_debounce_ms: 300,
            logging: LoggingConfig::default(),
        }
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub batch_size: Option<u32>,
    pub log_level: Option<String>,
}

impl ClientConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Resolve configuration from every source
    ///
    /// An explicit `config_path` must exist; the platform default path may be absent.
    pub fn resolve(config_path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_file(path)?
            }
            None => match default_config_path() {
                Some(path) if path.exists() => {
                    debug!("Loading config from {}", path.display());
                    Self::from_file(&path)?
                }
                Some(path) => {
                    warn!(
                        "Config file {} not found, using built-in defaults",
                        path.display()
                    );
                    Self::default()
                }
                None => {
                    warn!("Could not determine config directory, using built-in defaults");
                    Self::default()
                }
            },
        };

        config.apply_env()?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Ok(raw) = std::env::var(ENV_TIMEOUT_MS) {
            self.timeout_ms = raw.trim().parse().map_err(|_| {
                Error::Config(format!("{} must be an integer, got '{}'", ENV_TIMEOUT_MS, raw))
            })?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(url) = &overrides.base_url {
            self.base_url = url.clone();
        }
        if let Some(timeout_ms) = overrides.timeout_ms {
            self.timeout_ms = timeout_ms;
        }
        if let Some(batch_size) = overrides.batch_size {
            self.batch_size = batch_size;
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Reject values no component can work with
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(Error::Config("base_url must not be empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "base_url must start with http:// or https://, got '{}'",
                url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(Error::Config("timeout_ms must be greater than zero".to_string()));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be greater than zero".to_string()));
        }
        if self.search_limit == 0 {
            return Err(Error::Config("search_limit must be greater than zero".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Absolute URL of an API route, e.g. `api_url("/swipe/...")`
    pub fn api_url(&self, path: &str) -> String {
        let prefix = self.api_prefix.trim_matches('/');
        let path = path.trim_start_matches('/');
        if prefix.is_empty() {
            format!("{}/{}", self.origin(), path)
        } else {
            format!("{}/{}/{}", self.origin(), prefix, path)
        }
    }

    /// Health endpoint, served outside the API prefix
    pub fn health_url(&self) -> String {
        format!("{}/health", self.origin())
    }

    fn origin(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }
}

/// Platform config file location (`<config_dir>/investlink/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("investlink").join("config.toml"))
}
