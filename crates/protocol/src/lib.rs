//! Relay Protocol - Core types for the gateway relay
//!
//! This crate provides the types that flow through the send pipeline:
//! - `Reading` - a typed sensor sample produced by a data-intake adapter
//! - `WireMessage` - the outbound envelope with routing metadata
//! - `ProtocolError` - encode/decode failures
//!
//! # Design Principles
//!
//! - **Transport-agnostic**: any sender implementation (TCP, HTTPS, mock)
//!   receives the same encoded envelope; nothing here assumes a protocol
//!   beyond "a message with subject/timestamp/device-id/display-name
//!   metadata and a JSON body".
//! - **Arc-friendly**: encoded frames use `bytes::Bytes` so a frame can be
//!   shared between a send attempt and its retry without copying.

mod error;
mod reading;
mod wire;

pub use error::ProtocolError;
pub use reading::Reading;
pub use wire::WireMessage;

// Re-export bytes for convenience
pub use bytes::Bytes;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Maximum encoded frame size (16MB)
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;
