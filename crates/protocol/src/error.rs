//! Protocol error types

use thiserror::Error;

/// Errors from encoding or decoding relay messages
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// JSON serialization or deserialization failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Encoded frame exceeds the maximum allowed size
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge {
        /// Actual encoded size
        size: usize,
        /// Allowed maximum
        max: usize,
    },

    /// A reading is missing a field the wire envelope requires
    #[error("invalid reading: {0}")]
    InvalidReading(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::FrameTooLarge {
            size: 20,
            max: 10,
        };
        assert!(err.to_string().contains("20 bytes"));
        assert!(err.to_string().contains("max 10"));

        let err = ProtocolError::InvalidReading("empty device id".into());
        assert!(err.to_string().contains("empty device id"));
    }
}
