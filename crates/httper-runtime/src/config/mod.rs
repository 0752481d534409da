//! Configuration module for the httper generator.
//!
//! Generation settings and logging are loaded from layered sources (defaults,
//! config files, `HTTPER_*` environment variables) and validated before use.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{HttperConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, SpanEventConfig};
pub use validation::validate_config;
