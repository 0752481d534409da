//! Runtime error types.

use std::path::PathBuf;

use httper_core::GenerateError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while driving a generation run.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    /// A Rust source file could not be parsed.
    #[error("{}: {source}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: GenerateError,
    },

    /// A JSON program manifest could not be decoded.
    #[error("invalid program manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source path is neither a `.rs` file, a `.json` manifest nor a directory.
    #[error("unsupported source {}: expected a .rs file, a .json manifest or a directory", .0.display())]
    UnsupportedSource(PathBuf),

    #[error("no src:dst targets given")]
    NoTargets,

    /// Two targets render adapters with the same name.
    #[error("adapter '{0}' is requested more than once")]
    DuplicateAdapter(String),
}

impl RuntimeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
