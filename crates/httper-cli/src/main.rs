//! `httper` binary.
//!
//! ```text
//! httper [--mode minimal|extended] [--config FILE] [--source FILE]... <out> <src:dst>...
//! ```

mod cli;

use std::process::ExitCode;

use clap::Parser;
use httper_runtime::config::{ConfigLoader, validate_config};
use httper_runtime::{Generator, HttperConfig, LoggingBuilder, Output, RuntimeResult, logging};
use tracing::error;

use crate::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            LoggingBuilder::new().init();
            error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    logging::init_from_config(&config.logging);

    match run(&cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Generation failed");
            ExitCode::FAILURE
        }
    }
}

/// Loads layered configuration, then applies command-line overrides.
fn load_config(cli: &Cli) -> RuntimeResult<HttperConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(profile) = &cli.profile {
        loader = loader.profile(profile);
    }
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }

    let mut config = loader.load()?;
    cli.apply(&mut config);
    validate_config(&config)?;
    Ok(config)
}

fn run(cli: &Cli, config: HttperConfig) -> RuntimeResult<()> {
    let output = Output::parse(&cli.out);
    Generator::new(config.generate)
        .sources(cli.sources.iter().cloned())
        .run(&output, &cli.targets)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httper_runtime::RuntimeError;
    use std::fs;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("httper").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_run_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("store.rs");
        let config = dir.path().join("httper.toml");
        let out = dir.path().join("store_http.rs");
        fs::write(
            &source,
            "pub struct Store; impl Store { pub fn list(&self, getColor: String) -> Result<String, String> { Ok(getColor) } }",
        )
        .unwrap();
        fs::write(&config, "[generate]\nmode = \"minimal\"\n").unwrap();

        let cli = cli(&[
            "--mode",
            "extended",
            "--config",
            config.to_str().unwrap(),
            "--source",
            source.to_str().unwrap(),
            out.to_str().unwrap(),
            "Store:StoreHttp",
        ]);
        let loaded = load_config(&cli).unwrap();
        assert_eq!(loaded.generate.mode, httper_core::Mode::Extended);

        run(&cli, loaded).unwrap();
        let written = fs::read_to_string(&out).unwrap();
        assert!(written.contains("pub struct StoreHttp"));
    }

    #[test]
    fn test_missing_config_file() {
        let cli = cli(&["--config", "/nonexistent/httper.toml", "-", "A:B"]);
        assert!(matches!(load_config(&cli), Err(RuntimeError::Config(_))));
    }

    #[test]
    fn test_unknown_type_fails() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("empty.rs");
        fs::write(&source, "pub struct Other;").unwrap();
        let cli = cli(&["--source", source.to_str().unwrap(), "-", "Store:StoreHttp"]);

        let err = run(&cli, HttperConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Store"));
    }
}
