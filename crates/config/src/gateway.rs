//! Gateway pipeline settings

use std::time::Duration;

use serde::Deserialize;

/// Settings for the queue/worker/pool pipeline
///
/// All fields have sensible defaults - specify only what you change.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Number of pooled sender connections
    /// Default: 4, hard-capped at 64
    pub pool_size: usize,

    /// Worker poll interval between drain passes (milliseconds)
    /// Default: 50
    pub drain_poll_interval_ms: u64,

    /// How long the worker may take to become operational (milliseconds)
    /// Default: 5000
    pub start_timeout_ms: u64,

    /// How long a clean worker stop may take before forced abort
    /// (milliseconds). Default: 5000
    pub stop_timeout_ms: u64,

    /// Log a throughput checkpoint every N sent messages (0 disables)
    /// Default: 500
    pub log_threshold: u64,

    /// Subject tag attached to every outbound envelope
    pub subject: String,

    /// Gateway device identifier (used for raw pass-through payloads)
    pub device_id: String,

    /// Gateway display name
    pub display_name: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            pool_size: 4,
            drain_poll_interval_ms: 50,
            start_timeout_ms: 5000,
            stop_timeout_ms: 5000,
            log_threshold: 500,
            subject: "gateway".into(),
            device_id: "gateway".into(),
            display_name: "Gateway".into(),
        }
    }
}

impl GatewayConfig {
    pub fn drain_poll_interval(&self) -> Duration {
        Duration::from_millis(self.drain_poll_interval_ms)
    }

    pub fn start_timeout(&self) -> Duration {
        Duration::from_millis(self.start_timeout_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.drain_poll_interval(), Duration::from_millis(50));
        assert_eq!(config.stop_timeout(), Duration::from_millis(5000));
        assert_eq!(config.subject, "gateway");
    }

    #[test]
    fn test_parse_partial() {
        let config: GatewayConfig =
            toml::from_str("pool_size = 8\nsubject = \"wthr\"").unwrap();
        assert_eq!(config.pool_size, 8);
        assert_eq!(config.subject, "wthr");
        // Unspecified fields keep their defaults
        assert_eq!(config.drain_poll_interval_ms, 50);
    }
}
