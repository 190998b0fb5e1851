//! Configuration types for the ADB client.

use crate::errors::AdbError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Daemon endpoint settings.
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Daemon lifecycle settings.
    #[serde(default)]
    pub daemon: DaemonConfig,
}

/// Daemon endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Daemon host. The daemon only trusts local connections.
    #[serde(default = "default_host")]
    pub host: String,
    /// Daemon TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    adb_protocol::socket::DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    adb_protocol::socket::DEFAULT_PORT
}

/// Daemon lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Start the daemon automatically when a connection is refused.
    #[serde(default = "default_true")]
    pub auto_start: bool,
    /// Daemon executable, invoked with `start-server`.
    #[serde(default = "default_executable")]
    pub executable: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_executable() -> PathBuf {
    PathBuf::from("adb")
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            auto_start: default_true(),
            executable: default_executable(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            daemon: DaemonConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), AdbError> {
        if self.connection.host.is_empty() {
            return Err(AdbError::Config("host cannot be empty".to_string()));
        }
        if self.connection.port == 0 {
            return Err(AdbError::Config("port cannot be 0".to_string()));
        }
        if self.daemon.executable.as_os_str().is_empty() {
            return Err(AdbError::Config(
                "daemon executable cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not parse or fails
    /// validation.
    pub fn from_toml_str(document: &str) -> Result<Self, AdbError> {
        let config: Self =
            toml::from_str(document).map_err(|e| AdbError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Builder for creating a `Config`.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Sets the daemon host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.connection.host = host.into();
        self
    }

    /// Sets the daemon port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.connection.port = port;
        self
    }

    /// Enables or disables automatic daemon start.
    #[must_use]
    pub fn auto_start(mut self, auto_start: bool) -> Self {
        self.config.daemon.auto_start = auto_start;
        self
    }

    /// Sets the daemon executable.
    #[must_use]
    pub fn daemon_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.config.daemon.executable = executable.into();
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<Config, AdbError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
