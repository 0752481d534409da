//! Error types for the httper runtime.

use thiserror::Error;

/// Errors raised while binding request data to handler arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// A resolved value does not parse as the declared type.
    #[error("invalid value {value:?} for '{param}': {reason}")]
    Coerce {
        /// Parameter being bound.
        param: &'static str,
        /// Resolved text; empty when nothing was found.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// A mode name that is neither `minimal` nor `extended`.
    #[error("unknown mode '{0}', expected 'minimal' or 'extended'")]
    UnknownMode(String),
}

/// Result type for binding operations.
pub type BindResult<T> = Result<T, BindError>;
