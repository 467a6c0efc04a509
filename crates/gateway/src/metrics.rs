//! Gateway pipeline metrics
//!
//! Atomic counters shared by the service, worker and pool.
//! All operations use relaxed ordering; these values are advisory and
//! eventually consistent, never correctness-bearing.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for one gateway pipeline instance
///
/// # Thread Safety
///
/// All methods are safe to call from multiple tasks concurrently. Values
/// may be slightly stale when read.
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    /// Items accepted by the service and pushed onto the queue
    enqueued: AtomicU64,

    /// Items popped by the worker
    popped: AtomicU64,

    /// Items delivered by the pool (first attempt or retry)
    sent: AtomicU64,

    /// Items that failed after the retry and were dropped
    send_failures: AtomicU64,

    /// Pool-level retries (first attempt failed, second attempted)
    retries: AtomicU64,

    /// Items pushed back onto the queue after a pre-dispatch failure
    requeued: AtomicU64,

    /// Intake lines dropped before the queue (keep-running switch or a
    /// failed pre-transform)
    filtered: AtomicU64,
}

impl GatewayMetrics {
    /// Create a new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            popped: AtomicU64::new(0),
            sent: AtomicU64::new(0),
            send_failures: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            requeued: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_popped(&self) {
        self.popped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_send_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_requeued(&self) {
        self.requeued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_filtered(&self) {
        self.filtered.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            popped: self.popped.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            requeued: self.requeued.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of gateway metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub enqueued: u64,
    pub popped: u64,
    pub sent: u64,
    pub send_failures: u64,
    pub retries: u64,
    pub requeued: u64,
    pub filtered: u64,
}
