//! Runtime configuration for the tool registry.
//!
//! Every field has a default, so an empty TOML document (or no file at all)
//! yields a working configuration.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors returned while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// Path that was read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration document is not valid TOML for this schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The health-check interval is zero.
    #[error("health_check_interval_secs must be at least 1")]
    ZeroHealthCheckInterval,
}

/// Shortest pause the health monitor takes between cycles.
const MIN_HEALTH_CHECK_INTERVAL_SECS: u64 = 1;

/// Tool registry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolRegistryConfig {
    /// Location of the persisted server set.
    pub store_path: Utf8PathBuf,
    /// Pause between health-check cycles, in seconds.
    pub health_check_interval_secs: u64,
    /// Deadline for opening a client session, in seconds.
    pub connect_timeout_secs: u64,
    /// Deadline for a single tool invocation, in seconds.
    pub call_timeout_secs: u64,
    /// Deadline for fetching a tool catalog, in seconds.
    pub list_tools_timeout_secs: u64,
    /// Method sent as the health-check liveness probe.
    pub probe_method: String,
}

impl Default for ToolRegistryConfig {
    fn default() -> Self {
        Self {
            store_path: Utf8PathBuf::from("data/mcp_servers.json"),
            health_check_interval_secs: 60,
            connect_timeout_secs: 10,
            call_timeout_secs: 30,
            list_tools_timeout_secs: 10,
            probe_method: "ping".to_owned(),
        }
    }
}

impl ToolRegistryConfig {
    /// Parses configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys,
    /// and [`ConfigError::ZeroHealthCheckInterval`] for a zero interval.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(document)?;
        if config.health_check_interval_secs == 0 {
            return Err(ConfigError::ZeroHealthCheckInterval);
        }
        Ok(config)
    }

    /// Loads configuration from `path`; a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file exists but cannot be read or
    /// parsed.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(document) => Self::from_toml_str(&document),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path, "configuration file not found, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_owned(),
                source,
            }),
        }
    }

    /// Returns the health-check interval, never shorter than one second.
    #[must_use]
    pub const fn health_check_interval(&self) -> Duration {
        if self.health_check_interval_secs < MIN_HEALTH_CHECK_INTERVAL_SECS {
            return Duration::from_secs(MIN_HEALTH_CHECK_INTERVAL_SECS);
        }
        Duration::from_secs(self.health_check_interval_secs)
    }

    /// Returns the connect deadline.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Returns the invocation deadline.
    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Returns the catalog fetch deadline.
    #[must_use]
    pub const fn list_tools_timeout(&self) -> Duration {
        Duration::from_secs(self.list_tools_timeout_secs)
    }

    /// Overrides the store location.
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    /// Overrides the health-check interval, in seconds.
    #[must_use]
    pub const fn with_health_check_interval_secs(mut self, seconds: u64) -> Self {
        self.health_check_interval_secs = seconds;
        self
    }

    /// Overrides the connect deadline, in seconds.
    #[must_use]
    pub const fn with_connect_timeout_secs(mut self, seconds: u64) -> Self {
        self.connect_timeout_secs = seconds;
        self
    }
}
