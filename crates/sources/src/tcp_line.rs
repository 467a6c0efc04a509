//! TCP line source
//!
//! Accepts connections and relays each newline-delimited payload into
//! the gateway. Payloads are passed through as raw serialized strings;
//! whether they become typed readings is the gateway service's business
//! (its injected pre-transform decides).

use std::net::SocketAddr;
use std::sync::Arc;

use relay_gateway::GatewayService;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::{Result, SourceError};

/// TCP line source configuration
#[derive(Debug, Clone)]
pub struct TcpLineSourceConfig {
    /// Bind address (e.g. "0.0.0.0")
    pub address: String,

    /// Listen port (0 picks an ephemeral port)
    pub port: u16,
}

impl Default for TcpLineSourceConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: 5000,
        }
    }
}

impl TcpLineSourceConfig {
    /// Create a config with a custom port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }
}

/// Line-oriented TCP intake adapter
#[derive(Debug)]
pub struct TcpLineSource {
    listener: TcpListener,
    service: Arc<GatewayService>,
    cancel: CancellationToken,
}

impl TcpLineSource {
    /// Bind the listening socket
    ///
    /// Binding is split from `run` so callers (and tests) can learn the
    /// actual local address before the accept loop starts.
    pub async fn bind(
        config: TcpLineSourceConfig,
        service: Arc<GatewayService>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let addr = format!("{}:{}", config.address, config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| SourceError::Bind { addr, source })?;

        Ok(Self {
            listener,
            service,
            cancel,
        })
    }

    /// The bound local address
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr().ok()
    }

    /// Run the accept loop until cancelled
    ///
    /// Each connection gets its own handler task reading lines and
    /// enqueueing them.
    pub async fn run(self) {
        if let Some(addr) = self.local_addr() {
            tracing::info!(%addr, "tcp line source listening");
        }

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!(%peer, "intake connection accepted");
                        let service = Arc::clone(&self.service);
                        let cancel = self.cancel.clone();
                        tokio::spawn(handle_connection(stream, peer, service, cancel));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                    }
                },
            }
        }

        tracing::info!("tcp line source stopped");
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    service: Arc<GatewayService>,
    cancel: CancellationToken,
) {
    let mut lines = BufReader::new(stream).lines();
    let mut relayed = 0u64;

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };

        match line {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                service.enqueue_serialized(line.to_owned());
                relayed += 1;
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(%peer, error = %e, "intake read failed");
                break;
            }
        }
    }

    tracing::debug!(%peer, relayed, "intake connection closed");
}

#[cfg(test)]
#[path = "tcp_line_test.rs"]
mod tests;
