use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{BatchSenderWorker, WorkerConfig, WorkerState};
use crate::metrics::GatewayMetrics;
use crate::pool::{PoolConfig, SendersPool};
use crate::queue::AsyncQueue;
use crate::service::QueuedItem;
use crate::testing::{MockBehavior, MockTransport};

struct Rig {
    worker: BatchSenderWorker,
    queue: Arc<AsyncQueue<QueuedItem>>,
    pool: Arc<SendersPool>,
    transport: MockTransport,
    metrics: Arc<GatewayMetrics>,
}

fn rig(behavior: MockBehavior) -> Rig {
    let transport = MockTransport::new(behavior);
    let queue = Arc::new(AsyncQueue::new());
    let metrics = Arc::new(GatewayMetrics::new());
    let pool = Arc::new(SendersPool::new(
        Arc::new(transport.clone()),
        PoolConfig::default().with_size(2).with_log_threshold(0),
        Arc::clone(&metrics),
    ));
    let worker = BatchSenderWorker::new(
        Arc::clone(&queue),
        Arc::clone(&pool),
        WorkerConfig::default().with_drain_poll_interval(Duration::from_millis(10)),
        Arc::clone(&metrics),
    );
    Rig {
        worker,
        queue,
        pool,
        transport,
        metrics,
    }
}

async fn wait_for(deadline: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_start_twice_returns_false() {
    let rig = rig(MockBehavior::Succeed);

    assert!(rig.worker.start().await.unwrap());
    assert_eq!(rig.worker.state().await, WorkerState::Running);

    // Second start must not spawn a second loop
    assert!(!rig.worker.start().await.unwrap());

    assert!(rig.worker.stop(Duration::from_secs(1)).await);
}

#[tokio::test]
async fn test_stop_when_already_stopped_returns_false() {
    let rig = rig(MockBehavior::Succeed);

    assert!(!rig.worker.stop(Duration::from_secs(1)).await);

    assert!(rig.worker.start().await.unwrap());
    assert!(rig.worker.stop(Duration::from_secs(1)).await);
    assert_eq!(rig.worker.state().await, WorkerState::Stopped);

    assert!(!rig.worker.stop(Duration::from_secs(1)).await);
}

#[tokio::test]
async fn test_restart_after_stop() {
    let rig = rig(MockBehavior::Succeed);

    assert!(rig.worker.start().await.unwrap());
    assert!(rig.worker.stop(Duration::from_secs(1)).await);
    assert!(rig.worker.start().await.unwrap());
    assert!(rig.worker.stop(Duration::from_secs(1)).await);
}

// =============================================================================
// Draining
// =============================================================================

#[tokio::test]
async fn test_end_to_end_thousand_items() {
    let rig = rig(MockBehavior::Succeed);

    for _ in 0..1000 {
        rig.queue.push(QueuedItem::Serialized("42".into()));
    }

    rig.worker.start().await.unwrap();
    rig.worker.process();

    let drained = wait_for(Duration::from_secs(5), || {
        rig.transport.delivered() == 1000 && rig.queue.is_empty()
    })
    .await;
    assert!(drained, "delivered {} items", rig.transport.delivered());

    // All dispatched tasks completed and no new pushes happened
    assert!(wait_for(Duration::from_secs(1), || rig.worker.outstanding() == 0).await);
    assert_eq!(rig.metrics.snapshot().sent, 1000);

    rig.worker.stop(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn test_drain_budget_tracks_outstanding() {
    let rig = rig(MockBehavior::BlockForever);

    for _ in 0..5 {
        rig.queue.push(QueuedItem::Serialized("42".into()));
    }

    rig.worker.start().await.unwrap();
    rig.worker.process();

    assert!(wait_for(Duration::from_secs(2), || rig.worker.outstanding() == 5).await);

    for _ in 0..2 {
        rig.queue.push(QueuedItem::Serialized("42".into()));
    }
    rig.worker.process();
    assert!(wait_for(Duration::from_secs(2), || rig.worker.outstanding() == 7).await);

    // Every item was popped exactly once; repeated poll cycles with all
    // sends blocked must not pop anything beyond the queue's contents
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(rig.metrics.snapshot().popped, 7);
    assert_eq!(rig.worker.outstanding(), 7);
    assert!(rig.queue.is_empty());

    rig.worker.stop(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_failed_sends_are_dropped_and_counted() {
    let rig = rig(MockBehavior::FailSends);

    for _ in 0..3 {
        rig.queue.push(QueuedItem::Serialized("42".into()));
    }

    rig.worker.start().await.unwrap();
    rig.worker.process();

    assert!(
        wait_for(Duration::from_secs(2), || {
            rig.metrics.snapshot().send_failures == 3
        })
        .await
    );
    assert!(rig.queue.is_empty());
    assert!(wait_for(Duration::from_secs(1), || rig.worker.outstanding() == 0).await);

    rig.worker.stop(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn test_requeue_when_dispatch_not_attempted() {
    let rig = rig(MockBehavior::Succeed);

    // A closed pool rejects before any network attempt
    rig.pool.close().await;
    rig.queue.push(QueuedItem::Serialized("42".into()));

    rig.worker.start().await.unwrap();
    rig.worker.process();

    assert!(wait_for(Duration::from_secs(2), || {
        rig.metrics.snapshot().requeued >= 1
    })
    .await);
    assert_eq!(rig.transport.delivered(), 0);

    rig.worker.stop(Duration::from_secs(1)).await;
}

// =============================================================================
// Batch-completed hook
// =============================================================================

#[tokio::test]
async fn test_batch_done_reports_outcomes() {
    let transport = MockTransport::new(MockBehavior::Succeed);
    let queue = Arc::new(AsyncQueue::new());
    let metrics = Arc::new(GatewayMetrics::new());
    let pool = Arc::new(SendersPool::new(
        Arc::new(transport.clone()),
        PoolConfig::default().with_size(1).with_log_threshold(0),
        Arc::clone(&metrics),
    ));

    let (outcome_tx, mut outcome_rx) = tokio::sync::mpsc::unbounded_channel();
    let worker = BatchSenderWorker::new(
        Arc::clone(&queue),
        pool,
        WorkerConfig::default().with_drain_poll_interval(Duration::from_millis(10)),
        metrics,
    )
    .with_batch_done(move |outcomes| {
        let _ = outcome_tx.send(outcomes);
    });

    for _ in 0..3 {
        queue.push(QueuedItem::Serialized("42".into()));
    }

    worker.start().await.unwrap();
    worker.process();

    // Passes may split the items; collect until all three report back
    let mut total = 0;
    let deadline = Instant::now() + Duration::from_secs(2);
    while total < 3 && Instant::now() < deadline {
        match tokio::time::timeout(Duration::from_millis(500), outcome_rx.recv()).await {
            Ok(Some(outcomes)) => {
                assert!(outcomes.iter().all(|o| o.is_sent()));
                total += outcomes.len();
            }
            _ => break,
        }
    }
    assert_eq!(total, 3);

    worker.stop(Duration::from_secs(1)).await;
}

// =============================================================================
// Forced stop
// =============================================================================

#[tokio::test]
async fn test_stop_bounded_with_blocked_sends() {
    let rig = rig(MockBehavior::BlockForever);

    for _ in 0..10 {
        rig.queue.push(QueuedItem::Serialized("42".into()));
    }

    rig.worker.start().await.unwrap();
    rig.worker.process();
    assert!(wait_for(Duration::from_secs(2), || rig.transport.sends() > 0).await);

    // Every send hangs forever; stop must still return within roughly
    // the deadline instead of hanging
    let start = Instant::now();
    let stopped = rig.worker.stop(Duration::from_millis(500)).await;
    let elapsed = start.elapsed();

    assert!(stopped);
    assert!(elapsed < Duration::from_millis(650), "stop took {elapsed:?}");
    assert_eq!(rig.worker.state().await, WorkerState::Stopped);
}
