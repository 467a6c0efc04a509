//! Pooled reliable sender
//!
//! A fixed-size rotation of redundant `ReliableSender` slots in front of
//! one transport. Each call picks the next slot round-robin, spreading
//! load and isolating a bad connection to one-Nth of traffic.
//!
//! # Retry policy
//!
//! On the first failure for a given call the picked slot is marked dead
//! (the reliability wrapper does that as part of the failed send) and the
//! call retries exactly once on the next slot, which lazily re-establishes
//! its link. A second failure propagates to the caller - there is no
//! unbounded retry loop here.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use relay_protocol::{Reading, WireMessage};

use crate::error::SenderError;
use crate::metrics::GatewayMetrics;
use crate::sender::{ReliableSender, SenderTransport};

/// Hard upper bound on pool size
pub const MAX_POOL_SIZE: usize = 64;

/// Default number of pooled senders
const DEFAULT_POOL_SIZE: usize = 4;

/// Default throughput-log threshold (accepted sends per checkpoint)
const DEFAULT_LOG_THRESHOLD: u64 = 500;

/// Default per-sender close timeout at shutdown
const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of pooled senders; clamped to `1..=MAX_POOL_SIZE`
    pub size: usize,

    /// Subject tag attached to every outbound envelope
    pub subject: String,

    /// Gateway identity used as `from` for raw pass-through payloads
    pub device_id: String,

    /// Gateway display name used as `dspl` for raw pass-through payloads
    pub display_name: String,

    /// Log a throughput checkpoint every this many accepted sends
    /// (0 disables the checkpoint log)
    pub log_threshold: u64,

    /// Per-sender close timeout at shutdown
    pub close_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_POOL_SIZE,
            subject: "gateway".into(),
            device_id: "gateway".into(),
            display_name: "Gateway".into(),
            log_threshold: DEFAULT_LOG_THRESHOLD,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }
}

impl PoolConfig {
    /// Set the pool size (clamped at construction)
    #[must_use]
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Set the envelope subject
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Set the gateway identity for raw payloads
    #[must_use]
    pub fn with_identity(
        mut self,
        device_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        self.device_id = device_id.into();
        self.display_name = display_name.into();
        self
    }

    /// Set the throughput-log threshold
    #[must_use]
    pub fn with_log_threshold(mut self, threshold: u64) -> Self {
        self.log_threshold = threshold;
        self
    }

    /// Set the per-sender close timeout
    #[must_use]
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }
}

/// Fixed-size rotation of reliable senders over one transport
pub struct SendersPool {
    transport: Arc<dyn SenderTransport>,
    senders: Vec<ReliableSender>,

    /// Rotating pick cursor; interpreted modulo pool size
    cursor: AtomicUsize,

    /// Set once by `close()`; sends after that fail fast
    closed: AtomicBool,

    config: PoolConfig,
    metrics: Arc<GatewayMetrics>,

    /// Accepted sends, for the periodic throughput checkpoint
    accepted: AtomicU64,

    /// Last checkpoint time (epoch milliseconds)
    checkpoint_ms: AtomicU64,
}

impl SendersPool {
    /// Create a pool; `config.size` is clamped to `1..=MAX_POOL_SIZE`
    pub fn new(
        transport: Arc<dyn SenderTransport>,
        config: PoolConfig,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        let size = config.size.clamp(1, MAX_POOL_SIZE);
        if size != config.size {
            tracing::warn!(
                requested = config.size,
                effective = size,
                "pool size clamped"
            );
        }

        let senders = (0..size).map(ReliableSender::new).collect();

        tracing::info!(size, subject = %config.subject, "senders pool created");

        Self {
            transport,
            senders,
            cursor: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            config,
            metrics,
            accepted: AtomicU64::new(0),
            checkpoint_ms: AtomicU64::new(now_ms()),
        }
    }

    /// Effective pool size
    pub fn size(&self) -> usize {
        self.senders.len()
    }

    /// True once `close()` has run
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Send a typed reading
    ///
    /// Builds the wire envelope (subject, creation time, device id,
    /// display name, JSON body) and dispatches it through one pooled
    /// sender, retrying once on failure.
    pub async fn send_reading(&self, reading: &Reading) -> Result<(), SenderError> {
        let frame = WireMessage::for_reading(&self.config.subject, reading)?.encode()?;
        self.dispatch(&frame).await
    }

    /// Send an already-serialized payload
    ///
    /// The envelope's `from`/`dspl` come from the gateway identity since
    /// a raw payload carries no trusted device fields of its own.
    pub async fn send_serialized(&self, json: &str) -> Result<(), SenderError> {
        let frame = WireMessage::for_serialized(
            &self.config.subject,
            &self.config.device_id,
            &self.config.display_name,
            json,
        )
        .encode()?;
        self.dispatch(&frame).await
    }

    /// Round-robin pick of the next slot index
    fn pick(&self) -> usize {
        self.cursor.fetch_add(1, Ordering::Relaxed) % self.senders.len()
    }

    /// Dispatch one frame: pick, send, retry once on a different pick
    async fn dispatch(&self, frame: &[u8]) -> Result<(), SenderError> {
        if self.is_closed() {
            return Err(SenderError::PoolClosed);
        }

        let first = self.pick();
        match self.senders[first].send(self.transport.as_ref(), frame).await {
            Ok(()) => {
                self.record_accepted();
                return Ok(());
            }
            Err(first_err) => {
                // The failed slot is already dead-marked; re-pick once
                self.metrics.record_retry();
                tracing::warn!(
                    slot = first,
                    error = %first_err,
                    "send failed, retrying on next pooled sender"
                );
            }
        }

        let second = self.pick();
        match self.senders[second].send(self.transport.as_ref(), frame).await {
            Ok(()) => {
                self.record_accepted();
                Ok(())
            }
            Err(err) => {
                tracing::error!(slot = second, error = %err, "retry send failed");
                Err(err)
            }
        }
    }

    /// Count an accepted send; log a throughput checkpoint every
    /// `log_threshold` sends with the elapsed wall-time since the
    /// previous checkpoint
    fn record_accepted(&self) {
        self.metrics.record_sent();

        let threshold = self.config.log_threshold;
        if threshold == 0 {
            return;
        }

        let n = self.accepted.fetch_add(1, Ordering::Relaxed) + 1;
        if n % threshold != 0 {
            return;
        }

        let now = now_ms();
        let last = self.checkpoint_ms.swap(now, Ordering::Relaxed);
        tracing::info!(
            total_sent = n,
            window = threshold,
            elapsed_ms = now.saturating_sub(last),
            "throughput checkpoint"
        );
    }

    /// Close every pooled sender with a bounded timeout; shutdown only
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        for sender in &self.senders {
            sender.close(self.config.close_timeout).await;
        }

        tracing::info!(size = self.senders.len(), "senders pool closed");
    }
}

impl std::fmt::Debug for SendersPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendersPool")
            .field("size", &self.senders.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[inline]
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod tests;
