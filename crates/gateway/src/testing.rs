//! Shared test doubles for the gateway pipeline
//!
//! A scriptable in-memory transport standing in for a real broker
//! connection. Behavior is fixed at construction; counters expose what
//! the pipeline did to it.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SenderError;
use crate::sender::{SenderLink, SenderTransport};

/// What the mock links do on `send`
#[derive(Debug, Clone, Copy)]
pub enum MockBehavior {
    /// Every send succeeds
    Succeed,
    /// Every connect fails
    FailConnects,
    /// Every send fails with a timeout
    FailSends,
    /// Sends on the first established link report a remote close;
    /// links established after that succeed
    RemoteCloseOnce,
    /// The first N sends fail with a timeout, the rest succeed
    FailFirstSends(usize),
    /// Sends never complete
    BlockForever,
}

#[derive(Debug)]
struct MockState {
    behavior: MockBehavior,
    connects: AtomicUsize,
    sends: AtomicUsize,
    delivered: AtomicUsize,
    closes: AtomicUsize,
    failures_remaining: AtomicUsize,
    per_link_sends: std::sync::Mutex<Vec<usize>>,
}

/// Scriptable transport for tests; cheap to clone, counters are shared
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<MockState>,
}

impl MockTransport {
    pub fn new(behavior: MockBehavior) -> Self {
        let failures = match behavior {
            MockBehavior::FailFirstSends(n) => n,
            _ => 0,
        };
        Self {
            state: Arc::new(MockState {
                behavior,
                connects: AtomicUsize::new(0),
                sends: AtomicUsize::new(0),
                delivered: AtomicUsize::new(0),
                closes: AtomicUsize::new(0),
                failures_remaining: AtomicUsize::new(failures),
                per_link_sends: std::sync::Mutex::new(Vec::new()),
            }),
        }
    }

    /// Send attempts per established link, ordered by connect ordinal
    pub fn sends_by_link(&self) -> Vec<usize> {
        self.state.per_link_sends.lock().unwrap().clone()
    }

    /// Links established so far
    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    /// Send attempts across all links (including failed ones)
    pub fn sends(&self) -> usize {
        self.state.sends.load(Ordering::SeqCst)
    }

    /// Frames actually delivered
    pub fn delivered(&self) -> usize {
        self.state.delivered.load(Ordering::SeqCst)
    }

    /// Links closed so far
    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SenderTransport for MockTransport {
    async fn connect(&self) -> Result<Box<dyn SenderLink>, SenderError> {
        if matches!(self.state.behavior, MockBehavior::FailConnects) {
            return Err(SenderError::ConnectionFailed {
                target: "mock".into(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "scripted refusal"),
            });
        }
        let id = self.state.connects.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Box::new(MockLink {
            state: Arc::clone(&self.state),
            id,
        }))
    }
}

#[derive(Debug)]
struct MockLink {
    state: Arc<MockState>,
    /// 1-based connect ordinal, used by `RemoteCloseOnce`
    id: usize,
}

#[async_trait]
impl SenderLink for MockLink {
    async fn send(&mut self, _frame: &[u8]) -> Result<(), SenderError> {
        self.state.sends.fetch_add(1, Ordering::SeqCst);
        {
            let mut per_link = self.state.per_link_sends.lock().unwrap();
            if per_link.len() < self.id {
                per_link.resize(self.id, 0);
            }
            per_link[self.id - 1] += 1;
        }

        match self.state.behavior {
            MockBehavior::Succeed | MockBehavior::FailConnects => {}
            MockBehavior::FailSends => return Err(SenderError::Timeout),
            MockBehavior::RemoteCloseOnce => {
                if self.id == 1 {
                    return Err(SenderError::RemoteClosed);
                }
            }
            MockBehavior::FailFirstSends(_) => {
                let claimed = self
                    .state
                    .failures_remaining
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_sub(1))
                    .is_ok();
                if claimed {
                    return Err(SenderError::Timeout);
                }
            }
            MockBehavior::BlockForever => {
                std::future::pending::<()>().await;
                unreachable!("pending future completed");
            }
        }

        self.state.delivered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
    }
}
