//! Configuration loading for tablesync-relay.
//!
//! Configuration is loaded from a TOML file (default: `relay.toml`).

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for tablesync-relay.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Resource limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// TCP bind address (default: 127.0.0.1:4480).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Resource limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum encoded frame size in bytes (default: 1MB).
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,
    /// Maximum open channels per endpoint (default: 64).
    #[serde(default = "default_max_channels_per_endpoint")]
    pub max_channels_per_endpoint: usize,
    /// Seconds an endpoint may stay connected without listening or dialing
    /// (default: 10).
    #[serde(default = "default_listen_timeout_secs")]
    pub listen_timeout_secs: u64,
}

// Default value functions
fn default_bind_address() -> String {
    "127.0.0.1:4480".to_string()
}

fn default_max_frame_size() -> usize {
    tablesync_types::MAX_FRAME_SIZE
}

fn default_max_channels_per_endpoint() -> usize {
    64
}

fn default_listen_timeout_secs() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_frame_size: default_max_frame_size(),
            max_channels_per_endpoint: default_max_channels_per_endpoint(),
            listen_timeout_secs: default_listen_timeout_secs(),
        }
    }
}

impl LimitsConfig {
    /// Idle window before an endpoint must listen or dial.
    pub fn listen_timeout(&self) -> Duration {
        Duration::from_secs(self.listen_timeout_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.server.bind_address, "127.0.0.1:4480");
        assert_eq!(config.limits.max_frame_size, 1024 * 1024);
        assert_eq!(config.limits.max_channels_per_endpoint, 64);
        assert_eq!(config.limits.listen_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[server]
bind_address = "0.0.0.0:5000"

[limits]
max_frame_size = 65536
max_channels_per_endpoint = 8
listen_timeout_secs = 30
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:5000");
        assert_eq!(config.limits.max_frame_size, 65536);
        assert_eq!(config.limits.max_channels_per_endpoint, 8);
        assert_eq!(config.limits.listen_timeout_secs, 30);
    }

    #[test]
    fn config_missing_fields_use_defaults() {
        let toml = r#"
[server]
[limits]
max_channels_per_endpoint = 4
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:4480");
        assert_eq!(config.limits.max_channels_per_endpoint, 4);
        assert_eq!(config.limits.listen_timeout_secs, 10);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.limits.max_frame_size, 1024 * 1024);
    }

    #[test]
    fn from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");
        std::fs::write(&path, "[server\n").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("relay.toml"));

        let err = Config::from_file(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }
}
