//! Relay Senders - concrete transports for the gateway
//!
//! Implementations of the core's `SenderTransport` / `SenderLink`
//! boundary:
//!
//! - `TcpTransport` - length-prefixed frames over TCP, the default wire
//! - `NullTransport` - accepts and discards everything; for dry runs
//!
//! The core never sees these types directly; it holds an
//! `Arc<dyn SenderTransport>` and stays protocol-agnostic.

mod null;
mod tcp;

pub use null::NullTransport;
pub use tcp::{TcpTransport, TcpTransportConfig};
