//! Sender boundary and the per-connection reliability wrapper
//!
//! The core depends on two small traits: a `SenderTransport` that can
//! establish links to the remote endpoint, and a `SenderLink` that can
//! push one frame at a time over an established connection. Any wire
//! protocol may sit behind them.
//!
//! `ReliableSender` wraps one logical link with an explicit state machine:
//! `Disconnected` until first use, `Connected` after a lazy establish,
//! back to `Disconnected` when a send fails or the remote closes. The
//! state lives behind a single async mutex; the lock being held during
//! `connect` is the "connecting" phase.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::SenderError;

/// One established connection capable of transmitting frames
#[async_trait]
pub trait SenderLink: Send + std::fmt::Debug {
    /// Transmit one encoded frame
    async fn send(&mut self, frame: &[u8]) -> Result<(), SenderError>;

    /// Close the link; best-effort, errors are swallowed
    async fn close(&mut self);
}

/// Factory for links to the remote endpoint
#[async_trait]
pub trait SenderTransport: Send + Sync {
    /// Establish a fresh link
    async fn connect(&self) -> Result<Box<dyn SenderLink>, SenderError>;
}

/// Observable state of a pooled sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// No link established (initial, or dead after a failure)
    Disconnected,
    /// Link established and usable
    Connected,
}

enum LinkState {
    Disconnected,
    Connected(Box<dyn SenderLink>),
}

/// One pool slot: a lazily-established, self-healing connection
///
/// Never shared between pool slots; the pool owns a fixed set of these
/// and rotates over them.
pub struct ReliableSender {
    /// Slot index within the pool, for logging
    slot: usize,
    state: Mutex<LinkState>,
}

impl ReliableSender {
    pub(crate) fn new(slot: usize) -> Self {
        Self {
            slot,
            state: Mutex::new(LinkState::Disconnected),
        }
    }

    /// Slot index within the pool
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Current link status
    pub async fn status(&self) -> LinkStatus {
        match *self.state.lock().await {
            LinkState::Disconnected => LinkStatus::Disconnected,
            LinkState::Connected(_) => LinkStatus::Connected,
        }
    }

    /// Send one frame, establishing the link first if needed
    ///
    /// On failure the link is marked dead (closed without clean shutdown).
    /// When the failure was a remote close, a replacement link is
    /// established immediately so the next caller never observes a stale
    /// dead connection without a fresh one ready.
    pub async fn send(
        &self,
        transport: &dyn SenderTransport,
        frame: &[u8],
    ) -> Result<(), SenderError> {
        let mut state = self.state.lock().await;

        // Lazy establish; idempotent - only connects when disconnected
        if matches!(*state, LinkState::Disconnected) {
            let link = transport.connect().await.map_err(|e| {
                tracing::warn!(slot = self.slot, error = %e, "link establish failed");
                e
            })?;
            tracing::debug!(slot = self.slot, "link established");
            *state = LinkState::Connected(link);
        }

        let LinkState::Connected(link) = &mut *state else {
            // Establish above either succeeded or returned early
            unreachable!("sender must be connected after establish");
        };

        match link.send(frame).await {
            Ok(()) => Ok(()),
            Err(err) => {
                // Dead-mark: drop the broken link without clean shutdown
                if let LinkState::Connected(mut dead) =
                    std::mem::replace(&mut *state, LinkState::Disconnected)
                {
                    dead.close().await;
                }

                if matches!(err, SenderError::RemoteClosed) {
                    // Remote hangup: re-establish eagerly for the next caller
                    match transport.connect().await {
                        Ok(fresh) => {
                            tracing::debug!(slot = self.slot, "link re-established after remote close");
                            *state = LinkState::Connected(fresh);
                        }
                        Err(e) => {
                            tracing::warn!(slot = self.slot, error = %e, "re-establish after remote close failed");
                        }
                    }
                }

                Err(err)
            }
        }
    }

    /// Mark the sender dead, closing any live link
    ///
    /// Idempotent: a second call on an already-dead sender is a no-op.
    pub async fn set_dead(&self) {
        let mut state = self.state.lock().await;
        if let LinkState::Connected(mut link) =
            std::mem::replace(&mut *state, LinkState::Disconnected)
        {
            link.close().await;
            tracing::debug!(slot = self.slot, "sender marked dead");
        }
    }

    /// Close the sender with a bounded wait; used only at shutdown
    pub async fn close(&self, timeout: Duration) {
        if tokio::time::timeout(timeout, self.set_dead()).await.is_err() {
            tracing::warn!(slot = self.slot, "sender close timed out");
        }
    }
}

impl std::fmt::Debug for ReliableSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReliableSender")
            .field("slot", &self.slot)
            .finish()
    }
}
