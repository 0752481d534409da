//! Command-line definitions using clap.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use httper_core::{Mode, Target};
use httper_runtime::HttperConfig;

/// Binding mode as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Facets get, post, cookie, req
    #[value(alias = "std")]
    Minimal,
    /// Adds url, route and session facets
    #[value(alias = "gorilla")]
    Extended,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Minimal => Mode::Minimal,
            ModeArg::Extended => Mode::Extended,
        }
    }
}

/// Generate HTTP adapters for Rust backend types
#[derive(Debug, Parser)]
#[command(name = "httper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Binding mode (overrides the configuration file)
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Configuration file path
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Configuration profile
    #[arg(long)]
    pub profile: Option<String>,

    /// Rust source, JSON manifest or directory to read types from
    /// (default: the .rs files next to the output)
    #[arg(short = 's', long = "source")]
    pub sources: Vec<PathBuf>,

    /// Fail on parameters that cannot be bound
    #[arg(long)]
    pub strict_unbound: bool,

    /// Also accept prefix_name boundaries
    #[arg(long)]
    pub snake_case: bool,

    /// Path of the runtime crate in generated code
    #[arg(long)]
    pub runtime: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Output file, or - for stdout
    pub out: String,

    /// Backend and adapter type pairs, e.g. Controller:ControllerHttp
    #[arg(required = true, value_name = "SRC:DST")]
    pub targets: Vec<Target>,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut HttperConfig) {
        if let Some(mode) = self.mode {
            config.generate.mode = mode.into();
        }
        if self.strict_unbound {
            config.generate.strict_unbound = true;
        }
        if self.snake_case {
            config.generate.snake_case_boundaries = true;
        }
        if let Some(runtime) = &self.runtime {
            config.generate.runtime_path.clone_from(runtime);
        }
        if self.verbose {
            config.logging.level = httper_runtime::config::LogLevel::Debug;
        }
    }
}
