//! Generation-time error types.
//!
//! Every variant is fatal: generation aborts and no output is produced.

use thiserror::Error;

/// Errors that can occur while planning or rendering an adapter.
#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    /// The requested backend type is not declared in the program model.
    #[error("unknown type '{0}': no declaration found in the program model")]
    UnknownType(String),

    /// A `src:dst` target could not be parsed.
    #[error("invalid target '{0}': expected 'src:dst'")]
    InvalidTarget(String),

    /// A type expression could not be parsed as Rust.
    #[error("invalid type expression '{ty}': {reason}")]
    InvalidType {
        /// The offending type text.
        ty: String,
        /// Parser message.
        reason: String,
    },

    /// An identifier could not be used in emitted code.
    #[error("invalid identifier '{0}'")]
    InvalidIdent(String),

    /// The runtime crate path could not be parsed.
    #[error("invalid runtime path '{0}'")]
    InvalidRuntimePath(String),

    /// A backend method uses a finalizer name with an incompatible shape.
    #[error("'{type_name}::{method}' does not match the finalizer shape: expected {expected} parameters, found {found}")]
    FinalizerShape {
        /// Backend type.
        type_name: String,
        /// Finalizer method name.
        method: &'static str,
        /// Expected parameter count (excluding the receiver).
        expected: usize,
        /// Declared parameter count.
        found: usize,
    },

    /// A parameter could not be bound and unbound parameters are rejected.
    #[error("parameter '{param}' of '{method}' cannot be bound: {reason}")]
    Unbound {
        /// Method name.
        method: String,
        /// Parameter name.
        param: String,
        /// Why no strategy applied.
        reason: String,
    },

    /// The synthesized adapters do not form a valid source file.
    #[error("generated code does not parse: {0}")]
    Render(String),

    /// The program source could not be parsed.
    #[error("failed to parse program source: {0}")]
    Source(String),
}

impl GenerateError {
    /// Creates an invalid type error from a `syn` parse failure.
    pub fn invalid_type(ty: impl Into<String>, err: &syn::Error) -> Self {
        Self::InvalidType {
            ty: ty.into(),
            reason: err.to_string(),
        }
    }
}

impl From<syn::Error> for GenerateError {
    fn from(err: syn::Error) -> Self {
        Self::Source(err.to_string())
    }
}

/// Result type for generation operations.
pub type GenerateResult<T> = Result<T, GenerateError>;
