//! Configuration for the relay daemon
//!
//! Settings are loaded from a TOML file. Every section and field has a
//! default, so an empty file (or no file at all) yields a runnable
//! configuration with all sources disabled and a TCP sender that still
//! needs a `target` before it validates.
//!
//! # Example
//!
//! ```toml
//! [gateway]
//! pool_size = 8
//! subject = "plant-a"
//!
//! [sender]
//! type = "tcp"
//! target = "broker.example.com:5671"
//!
//! [sources.tcp]
//! enabled = true
//! port = 5000
//!
//! [log]
//! level = "info"
//! format = "console"
//! ```

mod error;
mod gateway;
mod logging;
mod sender;
mod sources;

pub use error::ConfigError;
pub use gateway::GatewayConfig;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use sender::{SenderConfig, SenderKind};
pub use sources::{MockIntakeConfig, SourcesConfig, TcpIntakeConfig};

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

/// Result alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub sender: SenderConfig,
    pub sources: SourcesConfig,
    pub log: LogConfig,
}

impl Config {
    /// Load and parse a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        contents.parse()
    }

    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.sender.kind == SenderKind::Tcp && self.sender.target.is_none() {
            return Err(ConfigError::MissingField {
                section: "sender",
                field: "target",
            });
        }
        if self.gateway.pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                section: "gateway",
                field: "pool_size",
                message: "must be at least 1".to_string(),
            });
        }
        if self.gateway.drain_poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                section: "gateway",
                field: "drain_poll_interval_ms",
                message: "must be at least 1".to_string(),
            });
        }
        if self.sources.mock.enabled {
            if self.sources.mock.interval_ms == 0 {
                return Err(ConfigError::InvalidValue {
                    section: "sources.mock",
                    field: "interval_ms",
                    message: "must be at least 1".to_string(),
                });
            }
            if self.sources.mock.device_count == 0 {
                return Err(ConfigError::InvalidValue {
                    section: "sources.mock",
                    field: "device_count",
                    message: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}
