//! Ingest source settings

use std::time::Duration;

use serde::Deserialize;

/// Line-delimited TCP intake
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TcpIntakeConfig {
    /// Whether the intake listener runs. Default: false
    pub enabled: bool,

    /// Bind address. Default: 0.0.0.0
    pub address: String,

    /// Bind port. Default: 5000
    pub port: u16,
}

impl Default for TcpIntakeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// Synthetic mock readings, for testing without devices
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MockIntakeConfig {
    /// Whether the mock generator runs. Default: false
    pub enabled: bool,

    /// Milliseconds between readings. Default: 1000
    pub interval_ms: u64,

    /// Number of simulated devices. Default: 1
    pub device_count: usize,
}

impl Default for MockIntakeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: 1000,
            device_count: 1,
        }
    }
}

impl MockIntakeConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// All ingest sources
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourcesConfig {
    pub tcp: TcpIntakeConfig,
    pub mock: MockIntakeConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_disabled() {
        let config = SourcesConfig::default();
        assert!(!config.tcp.enabled);
        assert!(!config.mock.enabled);
        assert_eq!(config.tcp.port, 5000);
        assert_eq!(config.mock.interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_parse_partial() {
        let config: SourcesConfig = toml::from_str(
            r#"
            [tcp]
            enabled = true
            port = 6100

            [mock]
            enabled = true
            device_count = 3
            "#,
        )
        .unwrap();
        assert!(config.tcp.enabled);
        assert_eq!(config.tcp.port, 6100);
        assert_eq!(config.tcp.address, "0.0.0.0");
        assert_eq!(config.mock.device_count, 3);
        assert_eq!(config.mock.interval_ms, 1000);
    }
}
