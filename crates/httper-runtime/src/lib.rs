//! httper Runtime - configuration, logging and the generation driver.
//!
//! This crate provides:
//! - Layered configuration (`httper.toml`, `HTTPER_*` variables) via figment
//! - Logging setup over `tracing-subscriber`
//! - The [`Generator`], which reads program models from Rust sources or JSON
//!   manifests, renders adapters and writes them atomically
//!
//! ```rust,ignore
//! use httper_runtime::{Generator, Output, config::load_config, logging};
//!
//! let config = load_config()?;
//! logging::init_from_config(&config.logging);
//!
//! let targets = vec!["Controller:ControllerHttp".parse()?];
//! Generator::new(config.generate).run(&Output::parse("controller_http.rs"), &targets)?;
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod logging;

pub use config::{ConfigError, ConfigLoader, ConfigResult, HttperConfig, LoggingConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use generator::{Generated, Generator, Output};
pub use logging::{LoggingBuilder, SpanEvents};

// Re-export tracing for use by other crates
pub use tracing;
