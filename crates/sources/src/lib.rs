//! Relay Sources - data-intake adapters
//!
//! Adapters that feed raw or typed messages into the gateway. Each one
//! only knows the `GatewayService` enqueue calls; everything downstream
//! (queue, worker, pool) is invisible to it.
//!
//! - `TcpLineSource` - newline-delimited payloads over TCP
//! - `MockSource` - synthetic readings on an interval, for demos and load

mod error;
mod mock;
mod tcp_line;

pub use error::SourceError;
pub use mock::{MockSource, MockSourceConfig};
pub use tcp_line::{TcpLineSource, TcpLineSourceConfig};

/// Result type for source operations
pub type Result<T> = std::result::Result<T, SourceError>;
