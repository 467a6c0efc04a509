//! Relay Gateway - the send pipeline
//!
//! An in-memory queue fed by data-intake adapters, drained by a dedicated
//! worker that pops items, builds wire envelopes, and dispatches them
//! through a pooled, retrying sender.
//!
//! # Architecture
//!
//! ```text
//! [Intake adapters]                [Core]                      [Network]
//!    TCP lines ──┐
//!    Mock ───────┼──→ GatewayService.enqueue ──→ AsyncQueue
//!    ...  ───────┘            │                      │
//!                             └── wake signal ──→ BatchSenderWorker
//!                                                    │ drain budget pops
//!                                                    ▼
//!                                              SendersPool ──→ SenderLink
//!                                              (round-robin,     (TCP, ...)
//!                                               retry once)
//! ```
//!
//! # Key Design
//!
//! - **Non-blocking queue**: `push` never blocks, `try_pop` never waits
//! - **Coalescing wake**: `process()` is a signal, not a counter; many
//!   enqueues collapse into one drain pass
//! - **Drain budget**: the worker pops `queue.len() - outstanding` items
//!   per pass, so a concurrent wake cannot over-drain
//! - **Retry once**: a failed send marks its pooled link dead and retries
//!   exactly once on the next pooled link; the second failure propagates
//! - **Cooperative stop**: `stop(timeout)` cancels, waits, then aborts the
//!   worker task; in-flight sends are abandoned, not cancelled
//!
//! Delivery is best-effort, at-most-once with opportunistic retry. There
//! is no durable queueing and no cross-process coordination.

mod error;
mod metrics;
mod pool;
mod queue;
mod sender;
mod service;
mod worker;

pub use error::{GatewayError, Result, SenderError};
pub use metrics::{GatewayMetrics, MetricsSnapshot};
pub use pool::{PoolConfig, SendersPool, MAX_POOL_SIZE};
pub use queue::AsyncQueue;
pub use sender::{LinkStatus, ReliableSender, SenderLink, SenderTransport};
pub use service::{GatewayService, QueuedItem};
pub use worker::{BatchSenderWorker, SendOutcome, WorkerConfig, WorkerState};

#[cfg(test)]
mod testing;
