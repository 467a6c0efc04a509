//! Source error types

use std::io;

use thiserror::Error;

/// Errors from intake adapters
#[derive(Debug, Error)]
pub enum SourceError {
    /// Could not bind the listening socket
    #[error("bind failed on {addr}: {source}")]
    Bind {
        /// Requested bind address
        addr: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },
}
