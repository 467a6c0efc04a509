//! Null transport - accepts and discards every frame
//!
//! Useful for dry runs and load testing the pipeline without a broker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use relay_gateway::{SenderError, SenderLink, SenderTransport};

/// Transport whose links accept everything and deliver nowhere
#[derive(Debug, Default)]
pub struct NullTransport {
    frames: Arc<AtomicU64>,
}

impl NullTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames accepted so far, across all links
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SenderTransport for NullTransport {
    async fn connect(&self) -> Result<Box<dyn SenderLink>, SenderError> {
        Ok(Box::new(NullLink {
            frames: Arc::clone(&self.frames),
        }))
    }
}

#[derive(Debug)]
struct NullLink {
    frames: Arc<AtomicU64>,
}

#[async_trait]
impl SenderLink for NullLink {
    async fn send(&mut self, frame: &[u8]) -> Result<(), SenderError> {
        self.frames.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(bytes = frame.len(), "null sender discarded frame");
        Ok(())
    }

    async fn close(&mut self) {}
}
