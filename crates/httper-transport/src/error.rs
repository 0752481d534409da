//! Error types for the transport layer.

use std::io;

use thiserror::Error;

/// Errors raised while serving adapters.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The listener could not bind its address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Any other I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
