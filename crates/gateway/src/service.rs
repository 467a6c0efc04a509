//! Gateway service - the enqueue-side orchestrator
//!
//! Receives raw or typed input from intake adapters, optionally applies
//! an injected pre-transform, pushes onto the queue and fires a
//! data-in-queue notification.
//!
//! The notification is a single injected callback rather than an event
//! with arbitrary subscribers: the default wiring calls
//! `BatchSenderWorker::process()`, but an alternate policy (accumulate
//! then drain on a timer, say) slots in without touching the queue or
//! the worker.

use std::sync::Arc;

use relay_protocol::Reading;

use crate::error::GatewayError;
use crate::metrics::GatewayMetrics;
use crate::queue::AsyncQueue;

/// One unit on the queue
///
/// Created on enqueue, never mutated, consumed exactly once by the
/// worker's drain pass.
#[derive(Debug, Clone, PartialEq)]
pub enum QueuedItem {
    /// Raw pass-through payload (already serialized by the producer)
    Serialized(String),
    /// Typed sensor reading
    Typed(Reading),
}

type OnDataFn = Arc<dyn Fn() + Send + Sync>;
type TransformFn = Arc<dyn Fn(&str) -> Result<Reading, GatewayError> + Send + Sync>;
type KeepRunningFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// The enqueue-side service handle given to intake adapters
///
/// Adapters only ever see `enqueue` / `enqueue_serialized`; everything
/// downstream of the queue is invisible to them.
pub struct GatewayService {
    queue: Arc<AsyncQueue<QueuedItem>>,
    on_data: OnDataFn,
    transform: Option<TransformFn>,
    keep_running: Option<KeepRunningFn>,
    metrics: Arc<GatewayMetrics>,
}

impl GatewayService {
    /// Create a service over a queue
    ///
    /// The data-in-queue notification defaults to a no-op; the worker's
    /// bounded poll still drains the queue, just less promptly. Install
    /// the real wake-up with [`with_on_data`](Self::with_on_data).
    pub fn new(queue: Arc<AsyncQueue<QueuedItem>>, metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            queue,
            on_data: Arc::new(|| {}),
            transform: None,
            keep_running: None,
            metrics,
        }
    }

    /// Install the data-in-queue notification callback
    #[must_use]
    pub fn with_on_data(mut self, on_data: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_data = Arc::new(on_data);
        self
    }

    /// Install a pre-transform for raw intake lines
    ///
    /// With a transform installed, raw lines become typed readings on the
    /// queue; lines the transform rejects are logged and dropped.
    #[must_use]
    pub fn with_transform(
        mut self,
        transform: impl Fn(&str) -> Result<Reading, GatewayError> + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Install the keep-running intake switch
    ///
    /// Raw lines for which the predicate returns `false` are dropped
    /// before they reach the queue.
    #[must_use]
    pub fn with_keep_running(
        mut self,
        keep_running: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.keep_running = Some(Arc::new(keep_running));
        self
    }

    /// Enqueue a typed reading and fire the notification
    pub fn enqueue(&self, reading: Reading) {
        self.queue.push(QueuedItem::Typed(reading));
        self.metrics.record_enqueued();
        (self.on_data)();
    }

    /// Enqueue a raw intake line and fire the notification
    ///
    /// Applies the keep-running switch and the pre-transform when
    /// installed. Without a transform the line relays as-is.
    pub fn enqueue_serialized(&self, raw: String) {
        if let Some(keep) = &self.keep_running {
            if !keep(&raw) {
                self.metrics.record_filtered();
                tracing::trace!("intake line rejected by keep-running switch");
                return;
            }
        }

        let item = match &self.transform {
            Some(transform) => match transform(&raw) {
                Ok(reading) => QueuedItem::Typed(reading),
                Err(err) => {
                    tracing::warn!(error = %err, "intake transform failed, dropping line");
                    self.metrics.record_filtered();
                    return;
                }
            },
            None => QueuedItem::Serialized(raw),
        };

        self.queue.push(item);
        self.metrics.record_enqueued();
        (self.on_data)();
    }

    /// Advisory queue depth
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }
}

impl std::fmt::Debug for GatewayService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayService")
            .field("queue_len", &self.queue.len())
            .field("has_transform", &self.transform.is_some())
            .field("has_keep_running", &self.keep_running.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
