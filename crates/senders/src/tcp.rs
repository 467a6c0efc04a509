//! TCP sender transport
//!
//! Delivers envelopes to a remote endpoint as length-prefixed frames:
//!
//! ```text
//! [4 bytes: length (big-endian)][N bytes: JSON envelope]
//! ```
//!
//! One `TcpLink` wraps one connection. A write error or timeout
//! invalidates the link; the pool's reliability wrapper handles
//! dead-marking and reconnection, this module only reports what broke.

use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use relay_gateway::{SenderError, SenderLink, SenderTransport};
use socket2::{SockRef, TcpKeepalive};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// TCP transport configuration
#[derive(Debug, Clone)]
pub struct TcpTransportConfig {
    /// Remote endpoint (host:port)
    pub target: String,

    /// Connection timeout
    pub connection_timeout: Duration,

    /// Write timeout per frame
    pub write_timeout: Duration,

    /// Disable Nagle's algorithm
    pub nodelay: bool,

    /// TCP keep-alive enabled
    pub keepalive: bool,

    /// TCP keep-alive interval (only used if keepalive is true)
    pub keepalive_interval: Duration,
}

impl TcpTransportConfig {
    /// Create a config for the given endpoint with default timeouts
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            connection_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(5),
            nodelay: true,
            keepalive: true,
            keepalive_interval: Duration::from_secs(30),
        }
    }

    /// Set the connection timeout
    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the per-frame write timeout
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Enable or disable TCP keep-alive
    #[must_use]
    pub fn with_keepalive(mut self, enabled: bool) -> Self {
        self.keepalive = enabled;
        self
    }

    /// Set the keep-alive interval
    #[must_use]
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }
}

/// Transport establishing length-prefixed TCP links
#[derive(Debug)]
pub struct TcpTransport {
    config: TcpTransportConfig,
}

impl TcpTransport {
    pub fn new(config: TcpTransportConfig) -> Self {
        Self { config }
    }

    /// The configured remote endpoint
    pub fn target(&self) -> &str {
        &self.config.target
    }
}

#[async_trait]
impl SenderTransport for TcpTransport {
    async fn connect(&self) -> Result<Box<dyn SenderLink>, SenderError> {
        let connect_result = timeout(
            self.config.connection_timeout,
            TcpStream::connect(&self.config.target),
        )
        .await;

        let stream = match connect_result {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(SenderError::ConnectionFailed {
                    target: self.config.target.clone(),
                    source: e,
                });
            }
            Err(_) => {
                return Err(SenderError::ConnectionFailed {
                    target: self.config.target.clone(),
                    source: std::io::Error::new(ErrorKind::TimedOut, "connection timed out"),
                });
            }
        };

        // Lower latency for small frames (non-fatal if it fails)
        if self.config.nodelay {
            if let Err(e) = stream.set_nodelay(true) {
                tracing::debug!(error = %e, "failed to set TCP_NODELAY");
            }
        }

        if self.config.keepalive {
            let sock_ref = SockRef::from(&stream);
            let keepalive = TcpKeepalive::new().with_time(self.config.keepalive_interval);

            // On Linux, also set the interval between probes
            #[cfg(target_os = "linux")]
            let keepalive = keepalive.with_interval(self.config.keepalive_interval);

            if let Err(e) = sock_ref.set_tcp_keepalive(&keepalive) {
                tracing::debug!(error = %e, "failed to set TCP keep-alive");
            }
        }

        tracing::debug!(target = %self.config.target, "tcp link connected");

        Ok(Box::new(TcpLink {
            stream,
            write_timeout: self.config.write_timeout,
        }))
    }
}

#[derive(Debug)]
struct TcpLink {
    stream: TcpStream,
    write_timeout: Duration,
}

#[async_trait]
impl SenderLink for TcpLink {
    async fn send(&mut self, frame: &[u8]) -> Result<(), SenderError> {
        let len_bytes = (frame.len() as u32).to_be_bytes();

        let write_result = timeout(self.write_timeout, async {
            self.stream.write_all(&len_bytes).await?;
            self.stream.write_all(frame).await?;
            self.stream.flush().await?;
            Ok::<(), std::io::Error>(())
        })
        .await;

        match write_result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(classify_io_error(e)),
            Err(_) => Err(SenderError::Timeout),
        }
    }

    async fn close(&mut self) {
        let _ = self.stream.shutdown().await;
    }
}

/// Map write errors onto the sender taxonomy
///
/// Remote hangups get their own variant so the reliability wrapper can
/// re-establish eagerly; everything else is a plain write failure.
fn classify_io_error(e: std::io::Error) -> SenderError {
    match e.kind() {
        ErrorKind::BrokenPipe
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::UnexpectedEof
        | ErrorKind::WriteZero => SenderError::RemoteClosed,
        _ => SenderError::WriteFailed(e),
    }
}

#[cfg(test)]
#[path = "tcp_test.rs"]
mod tests;
