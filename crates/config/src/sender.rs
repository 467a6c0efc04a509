//! Sender transport settings

use std::time::Duration;

use serde::Deserialize;

/// Which transport carries outbound envelopes
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SenderKind {
    /// Length-prefixed frames over TCP (default)
    #[default]
    Tcp,
    /// Accept and discard; for dry runs without a broker
    Null,
}

/// Sender transport configuration
///
/// # Example
///
/// ```toml
/// [sender]
/// type = "tcp"
/// target = "broker.example.com:5671"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SenderConfig {
    /// Transport type (tcp, null)
    #[serde(rename = "type")]
    pub kind: SenderKind,

    /// Remote endpoint (host:port); required for tcp
    pub target: Option<String>,

    /// Connection timeout (seconds). Default: 10
    pub connection_timeout_secs: u64,

    /// Per-frame write timeout (seconds). Default: 5
    pub write_timeout_secs: u64,

    /// Per-sender close timeout at shutdown (milliseconds). Default: 2000
    pub close_timeout_ms: u64,

    /// TCP keep-alive enabled. Default: true
    pub keepalive: bool,

    /// TCP keep-alive interval (seconds). Default: 30
    pub keepalive_interval_secs: u64,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            kind: SenderKind::Tcp,
            target: None,
            connection_timeout_secs: 10,
            write_timeout_secs: 5,
            close_timeout_ms: 2000,
            keepalive: true,
            keepalive_interval_secs: 30,
        }
    }
}

impl SenderConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }
}
