//! Batch sender worker
//!
//! A dedicated task that drains the queue and dispatches items through
//! the pool. It wakes on a coalescing signal (`process()`) or after a
//! short bounded poll, computes how many items it may safely pop given
//! the number of in-flight sends, and dispatches each popped item as its
//! own task.
//!
//! # Drain budget
//!
//! `budget = queue.len() - outstanding`. The outstanding counter is
//! incremented before an item is handed to its send task and decremented
//! when that task completes, so two overlapping drain passes can never
//! commit more work than the queue actually holds.
//!
//! # Lifecycle
//!
//! `Stopped -> Starting -> Running -> Stopping -> Stopped`. `start()`
//! waits (bounded) for the task's operational signal; `stop(timeout)`
//! cancels cooperatively and aborts the task if it misses the deadline.
//! In-flight sends are abandoned at that point, not cancelled - items
//! mid-flight during a forced stop are lost by design.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{GatewayError, Result, SenderError};
use crate::metrics::GatewayMetrics;
use crate::pool::SendersPool;
use crate::queue::AsyncQueue;
use crate::service::QueuedItem;

/// Default bounded poll between drain passes
///
/// Short on purpose: it closes the race window between "send task
/// completed, counter not yet decremented" and "new items pushed".
const DEFAULT_DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default wait for the worker task to signal readiness
const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(5);

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Bounded poll between drain passes
    pub drain_poll_interval: Duration,

    /// How long `start()` waits for the operational signal
    pub start_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            drain_poll_interval: DEFAULT_DRAIN_POLL_INTERVAL,
            start_timeout: DEFAULT_START_TIMEOUT,
        }
    }
}

impl WorkerConfig {
    /// Set the drain poll interval
    #[must_use]
    pub fn with_drain_poll_interval(mut self, interval: Duration) -> Self {
        self.drain_poll_interval = interval;
        self
    }

    /// Set the start timeout
    #[must_use]
    pub fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }
}

/// Lifecycle state of the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// Result of dispatching one popped item
#[derive(Debug)]
pub enum SendOutcome {
    /// Delivered (first attempt or pool retry)
    Sent,
    /// Never reached the network; pushed back onto the queue
    Requeued,
    /// Failed after the pool's retry and was dropped
    Failed(SenderError),
}

impl SendOutcome {
    /// True when the item was delivered
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// Observability hook invoked with each drain pass's outcomes
type BatchDoneFn = Arc<dyn Fn(Vec<SendOutcome>) + Send + Sync>;

/// State shared between the handle and the worker task
struct WorkerShared {
    queue: Arc<AsyncQueue<QueuedItem>>,
    pool: Arc<SendersPool>,

    /// In-flight send tasks not yet completed; the only cross-task
    /// mutable state in the worker, mutated only atomically
    outstanding: AtomicUsize,

    /// Coalescing wake signal
    wake: Notify,

    metrics: Arc<GatewayMetrics>,
}

struct Lifecycle {
    state: WorkerState,
    cancel: Option<CancellationToken>,
    join: Option<JoinHandle<()>>,
}

/// The batch sender worker handle
///
/// One dedicated task per instance; multiple gateway/worker pairs may
/// coexist in-process, each independent.
pub struct BatchSenderWorker {
    shared: Arc<WorkerShared>,
    config: WorkerConfig,
    lifecycle: Mutex<Lifecycle>,
    batch_done: Option<BatchDoneFn>,
}

impl BatchSenderWorker {
    /// Create a worker over a queue and a pool
    pub fn new(
        queue: Arc<AsyncQueue<QueuedItem>>,
        pool: Arc<SendersPool>,
        config: WorkerConfig,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        Self {
            shared: Arc::new(WorkerShared {
                queue,
                pool,
                outstanding: AtomicUsize::new(0),
                wake: Notify::new(),
                metrics,
            }),
            config,
            lifecycle: Mutex::new(Lifecycle {
                state: WorkerState::Stopped,
                cancel: None,
                join: None,
            }),
            batch_done: None,
        }
    }

    /// Install the batch-completed hook; call before `start()`
    #[must_use]
    pub fn with_batch_done(
        mut self,
        hook: impl Fn(Vec<SendOutcome>) + Send + Sync + 'static,
    ) -> Self {
        self.batch_done = Some(Arc::new(hook));
        self
    }

    /// Current lifecycle state
    pub async fn state(&self) -> WorkerState {
        self.lifecycle.lock().await.state
    }

    /// Current number of in-flight send tasks
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::Acquire)
    }

    /// Wake the worker for a drain pass
    ///
    /// Non-blocking and safe from any task; repeated calls coalesce into
    /// a single wake (a signal, not a counter).
    pub fn process(&self) {
        self.shared.wake.notify_one();
    }

    /// Spawn the worker task and wait for it to become operational
    ///
    /// Returns `Ok(false)` if the worker is already running. The wait is
    /// bounded by `start_timeout` so a task that fails to start cannot
    /// hang the caller forever.
    pub async fn start(&self) -> Result<bool> {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.state != WorkerState::Stopped {
            return Ok(false);
        }
        lifecycle.state = WorkerState::Starting;

        let cancel = CancellationToken::new();
        let (ready_tx, ready_rx) = oneshot::channel();

        let join = tokio::spawn(run_loop(
            Arc::clone(&self.shared),
            self.config.drain_poll_interval,
            cancel.clone(),
            self.batch_done.clone(),
            ready_tx,
        ));

        match tokio::time::timeout(self.config.start_timeout, ready_rx).await {
            Ok(Ok(())) => {
                lifecycle.state = WorkerState::Running;
                lifecycle.cancel = Some(cancel);
                lifecycle.join = Some(join);
                tracing::info!("batch sender worker running");
                Ok(true)
            }
            _ => {
                cancel.cancel();
                join.abort();
                lifecycle.state = WorkerState::Stopped;
                Err(GatewayError::StartTimeout(self.config.start_timeout))
            }
        }
    }

    /// Stop the worker, waiting up to `timeout` for a clean exit
    ///
    /// Returns `false` if the worker was not running. On a missed
    /// deadline the task is aborted; in-flight send tasks are abandoned,
    /// so a misbehaving send call may outlive the nominal deadline - a
    /// documented best-effort limitation.
    pub async fn stop(&self, timeout: Duration) -> bool {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.state != WorkerState::Running {
            return false;
        }
        lifecycle.state = WorkerState::Stopping;

        if let Some(cancel) = lifecycle.cancel.take() {
            cancel.cancel();
        }
        // Wake the loop so it observes the cancellation promptly
        self.shared.wake.notify_one();

        if let Some(mut join) = lifecycle.join.take() {
            match tokio::time::timeout(timeout, &mut join).await {
                Ok(_) => {
                    tracing::info!("batch sender worker stopped");
                }
                Err(_) => {
                    tracing::warn!(
                        timeout_ms = timeout.as_millis() as u64,
                        "worker missed stop deadline, aborting"
                    );
                    join.abort();
                    let _ = join.await;
                }
            }
        }

        lifecycle.state = WorkerState::Stopped;
        true
    }
}

impl std::fmt::Debug for BatchSenderWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchSenderWorker")
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

/// The worker task body
async fn run_loop(
    shared: Arc<WorkerShared>,
    poll: Duration,
    cancel: CancellationToken,
    batch_done: Option<BatchDoneFn>,
    ready_tx: oneshot::Sender<()>,
) {
    // Operational signal: start() is waiting on this
    let _ = ready_tx.send(());
    tracing::debug!("worker loop operational");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = shared.wake.notified() => {}
            _ = tokio::time::sleep(poll) => {}
        }

        drain_pass(&shared, batch_done.as_ref());
    }

    tracing::debug!("worker loop exited");
}

/// One drain pass: pop up to the budget, dispatch each item as a task
fn drain_pass(shared: &Arc<WorkerShared>, batch_done: Option<&BatchDoneFn>) {
    let outstanding = shared.outstanding.load(Ordering::Acquire);
    let budget = shared.queue.len().saturating_sub(outstanding);
    if budget == 0 {
        return;
    }

    let mut handles = Vec::with_capacity(budget);
    for _ in 0..budget {
        let Some(item) = shared.queue.try_pop() else {
            break;
        };

        // Commit the slot before dispatch so an overlapping pass sees it
        shared.outstanding.fetch_add(1, Ordering::AcqRel);
        shared.metrics.record_popped();

        let shared = Arc::clone(shared);
        handles.push(tokio::spawn(async move {
            let outcome = dispatch_item(&shared, item).await;
            shared.outstanding.fetch_sub(1, Ordering::AcqRel);
            outcome
        }));
    }

    if handles.is_empty() {
        return;
    }
    tracing::trace!(batch = handles.len(), "drain pass dispatched");

    // The pass itself never waits on sends; when a hook is installed, a
    // side task aggregates this batch's outcomes for it
    if let Some(hook) = batch_done {
        let hook = Arc::clone(hook);
        tokio::spawn(async move {
            let mut outcomes = Vec::with_capacity(handles.len());
            for handle in handles {
                match handle.await {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(err) => tracing::error!(error = %err, "send task did not complete"),
                }
            }
            hook(outcomes);
        });
    }
}

/// Send one item through the pool; errors are logged, never propagated
async fn dispatch_item(shared: &WorkerShared, item: QueuedItem) -> SendOutcome {
    let result = match &item {
        QueuedItem::Typed(reading) => shared.pool.send_reading(reading).await,
        QueuedItem::Serialized(raw) => shared.pool.send_serialized(raw).await,
    };

    match result {
        Ok(()) => SendOutcome::Sent,
        Err(err) if err.is_pre_dispatch() => {
            // The item never reached the network; give it a later retry.
            // Best-effort only - at-most-once remains the contract.
            tracing::warn!(error = %err, "dispatch not attempted, re-queueing item");
            shared.metrics.record_requeued();
            shared.queue.push(item);
            SendOutcome::Requeued
        }
        Err(err) => {
            tracing::error!(error = %err, "send failed, item dropped");
            shared.metrics.record_send_failure();
            SendOutcome::Failed(err)
        }
    }
}

#[cfg(test)]
#[path = "worker_test.rs"]
mod tests;
