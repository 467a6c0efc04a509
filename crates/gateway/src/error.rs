//! Gateway error types

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors from the gateway orchestration layer
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The worker task did not signal readiness within the start timeout
    #[error("worker failed to become operational within {0:?}")]
    StartTimeout(Duration),

    /// An intake line could not be transformed into a typed reading
    #[error("transform failed: {0}")]
    Transform(String),

    /// A send failed after the pool's retry
    #[error(transparent)]
    Send(#[from] SenderError),
}

/// Errors from a sender link or the pool around it
///
/// A single link failure is transient from the pool's point of view: it
/// marks the link dead and retries once on another pooled link. Only the
/// second failure reaches callers.
#[derive(Debug, Error)]
pub enum SenderError {
    /// Could not establish a connection to the remote endpoint
    #[error("connection failed to {target}: {source}")]
    ConnectionFailed {
        /// Remote endpoint
        target: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Writing the frame failed mid-send
    #[error("write failed: {0}")]
    WriteFailed(#[from] io::Error),

    /// The remote side closed the link
    #[error("remote closed the link")]
    RemoteClosed,

    /// The send did not complete within the link's write timeout
    #[error("send timed out")]
    Timeout,

    /// Building the wire envelope failed before any network attempt
    #[error("encode failed: {0}")]
    Encode(#[from] relay_protocol::ProtocolError),

    /// The pool has been closed; the item was never dispatched
    #[error("sender pool is closed")]
    PoolClosed,
}

impl SenderError {
    /// True when the payload never reached the network, so the caller
    /// still owns a deliverable item (used for best-effort re-queueing)
    pub fn is_pre_dispatch(&self) -> bool {
        matches!(self, Self::PoolClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GatewayError::StartTimeout(Duration::from_secs(5));
        assert!(err.to_string().contains("operational"));

        let err = SenderError::ConnectionFailed {
            target: "broker:5671".into(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert!(err.to_string().contains("broker:5671"));

        let err = SenderError::PoolClosed;
        assert!(err.to_string().contains("closed"));
    }

    #[test]
    fn test_pre_dispatch_classification() {
        assert!(SenderError::PoolClosed.is_pre_dispatch());
        assert!(!SenderError::Timeout.is_pre_dispatch());
        assert!(!SenderError::RemoteClosed.is_pre_dispatch());
    }
}
