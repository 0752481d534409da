//! Generation driver: loads a program model, plans and renders every target,
//! then writes the output artifact.
//!
//! Everything is rendered in memory first. A file destination is written
//! through a temporary file in the same directory and persisted atomically,
//! so a failed run never leaves a partial file behind.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use httper_core::{
    Diagnostic, GenerateConfig, Program, Synthesizer, Target, plan_adapter, render_file, source,
};
use tempfile::NamedTempFile;
use tracing::{debug, info, info_span, warn};

use crate::error::{RuntimeError, RuntimeResult};

/// Where the generated source goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

impl Output {
    /// `-` means stdout; anything else is a file path.
    pub fn parse(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdout
        } else {
            Self::File(PathBuf::from(arg))
        }
    }

    /// Directory scanned for sources when none are given.
    pub fn dir(&self) -> PathBuf {
        match self {
            Self::Stdout => PathBuf::from("."),
            Self::File(path) => match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
        }
    }

    /// Writes `contents` in one piece.
    pub fn write(&self, contents: &str) -> RuntimeResult<()> {
        match self {
            Self::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout
                    .write_all(contents.as_bytes())
                    .and_then(|()| stdout.flush())
                    .map_err(|e| RuntimeError::io("<stdout>", e))
            }
            Self::File(path) => write_atomic(path, contents, &self.dir()),
        }
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("<stdout>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn write_atomic(path: &Path, contents: &str, dir: &Path) -> RuntimeResult<()> {
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| RuntimeError::io(dir, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| RuntimeError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| RuntimeError::io(path, e.error))?;
    Ok(())
}

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct Generated {
    /// The complete output file.
    pub source: String,
    /// Diagnostics per adapter name.
    pub diagnostics: Vec<(String, Diagnostic)>,
}

/// Drives one generation run.
///
/// ```rust,ignore
/// let generated = Generator::new(config)
///     .source("src/controller.rs")
///     .run(&Output::parse("src/controller_http.rs"), &targets)?;
/// ```
#[derive(Debug, Clone)]
pub struct Generator {
    config: GenerateConfig,
    sources: Vec<PathBuf>,
}

impl Generator {
    pub fn new(config: GenerateConfig) -> Self {
        Self {
            config,
            sources: Vec::new(),
        }
    }

    /// Adds a `.rs` file, a `.json` manifest or a directory of `.rs` files.
    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(path.into());
        self
    }

    pub fn sources<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.sources.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn config(&self) -> &GenerateConfig {
        &self.config
    }

    /// Builds the program model.
    ///
    /// Without explicit sources, every `.rs` file next to the output is read,
    /// except the output file itself.
    pub fn load_program(&self, output: &Output) -> RuntimeResult<Program> {
        let mut program = Program::new();

        if self.sources.is_empty() {
            let dir = output.dir();
            let skip = match output {
                Output::File(path) => path.file_name().map(|n| n.to_os_string()),
                Output::Stdout => None,
            };
            for path in rust_files(&dir)? {
                if skip.as_deref().is_some_and(|name| path.file_name() == Some(name)) {
                    debug!(path = %path.display(), "Skipping output file");
                    continue;
                }
                program.merge(load_rust(&path)?);
            }
            return Ok(program);
        }

        for path in &self.sources {
            program.merge(load_source(path)?);
        }
        Ok(program)
    }

    /// Plans and renders every target against `program`.
    pub fn render(&self, program: &Program, targets: &[Target]) -> RuntimeResult<Generated> {
        if targets.is_empty() {
            return Err(RuntimeError::NoTargets);
        }

        let synthesizer = Synthesizer::new(&self.config)?;
        let mut seen = HashSet::new();
        let mut adapters = Vec::with_capacity(targets.len());
        let mut diagnostics = Vec::new();

        for target in targets {
            if !seen.insert(target.dst.as_str()) {
                return Err(RuntimeError::DuplicateAdapter(target.dst.clone()));
            }
            let _span = info_span!("adapter", target = %target).entered();

            let plan = plan_adapter(program, target, &self.config)?;
            adapters.push(synthesizer.adapter(&plan)?);
            debug!(handlers = plan.methods.len(), "Rendered adapter");

            diagnostics.extend(
                plan.diagnostics
                    .into_iter()
                    .map(|d| (target.dst.clone(), d)),
            );
        }

        Ok(Generated {
            source: render_file(&adapters, &self.config.runtime_path)?,
            diagnostics,
        })
    }

    /// Loads, renders and writes in one go.
    pub fn run(&self, output: &Output, targets: &[Target]) -> RuntimeResult<Generated> {
        let program = self.load_program(output)?;
        debug!(types = program.types.len(), "Loaded program model");

        let generated = self.render(&program, targets)?;
        for (adapter, diagnostic) in &generated.diagnostics {
            warn!(%adapter, "{diagnostic}");
        }

        output.write(&generated.source)?;
        info!(
            output = %output,
            mode = %self.config.mode,
            adapters = targets.len(),
            "Wrote generated adapters"
        );
        Ok(generated)
    }
}

fn load_source(path: &Path) -> RuntimeResult<Program> {
    if path.is_dir() {
        let mut program = Program::new();
        for file in rust_files(path)? {
            program.merge(load_rust(&file)?);
        }
        return Ok(program);
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some("rs") => load_rust(path),
        Some("json") => load_manifest(path),
        _ => Err(RuntimeError::UnsupportedSource(path.to_path_buf())),
    }
}

fn load_rust(path: &Path) -> RuntimeResult<Program> {
    let text = fs::read_to_string(path).map_err(|e| RuntimeError::io(path, e))?;
    let program = source::parse_source(&text).map_err(|source| RuntimeError::Source {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), types = program.types.len(), "Parsed Rust source");
    Ok(program)
}

fn load_manifest(path: &Path) -> RuntimeResult<Program> {
    let text = fs::read_to_string(path).map_err(|e| RuntimeError::io(path, e))?;
    serde_json::from_str(&text).map_err(|source| RuntimeError::Manifest {
        path: path.to_path_buf(),
        source,
    })
}

/// `.rs` files directly under `dir`, sorted by name.
fn rust_files(dir: &Path) -> RuntimeResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| RuntimeError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| RuntimeError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "rs") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httper_core::{GenerateError, Mode};

    const CONTROLLER: &str = r#"
        pub struct Controller;

        impl Controller {
            pub fn get_by_id(&self, urlID: i64) -> Result<std::io::Cursor<Vec<u8>>, String> {
                todo!()
            }

            pub fn update(&self, req_body: RequestBody, getName: String) -> Result<String, String> {
                todo!()
            }
        }
    "#;

    fn targets(specs: &[&str]) -> Vec<Target> {
        specs.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_output_parse() {
        assert_eq!(Output::parse("-"), Output::Stdout);
        assert_eq!(Output::parse("out.rs"), Output::File("out.rs".into()));
        assert_eq!(Output::parse("out.rs").dir(), PathBuf::from("."));
        assert_eq!(Output::parse("src/out.rs").dir(), PathBuf::from("src"));
    }

    #[test]
    fn test_run_writes_file_next_to_sources() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("controller.rs"), CONTROLLER).unwrap();
        let out = Output::File(dir.path().join("controller_http.rs"));

        let generator = Generator::new(GenerateConfig::new(Mode::Extended));
        let generated = generator
            .run(&out, &targets(&["Controller:ControllerHttp"]))
            .unwrap();

        let written = fs::read_to_string(dir.path().join("controller_http.rs")).unwrap();
        assert_eq!(written, generated.source);
        assert!(written.starts_with("// Code generated by httper. DO NOT EDIT."));
        assert!(written.contains("pub struct ControllerHttp"));

        // A second run ignores the file it produced.
        assert!(generator.run(&out, &targets(&["Controller:ControllerHttp"])).is_ok());
    }

    #[test]
    fn test_json_manifest_source() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("program.json");
        fs::write(
            &manifest,
            r#"{"types":[{"name":"Store","methods":[
                {"name":"count","params":[{"name":"getKind","shape":"text","ty":"String"}],
                 "exported":true,"returns_result":true}
            ]}]}"#,
        )
        .unwrap();

        let generator = Generator::new(GenerateConfig::default()).source(&manifest);
        let program = generator.load_program(&Output::Stdout).unwrap();
        let generated = generator
            .render(&program, &targets(&["Store:StoreHttp"]))
            .unwrap();
        assert!(generated.source.contains("StoreHttp"));
        assert!(generated.diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_type_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("controller.rs"), CONTROLLER).unwrap();
        let out_path = dir.path().join("out.rs");

        let result = Generator::new(GenerateConfig::default())
            .run(&Output::File(out_path.clone()), &targets(&["Missing:MissingHttp"]));

        assert!(matches!(
            result,
            Err(RuntimeError::Generate(GenerateError::UnknownType(name))) if name == "Missing"
        ));
        assert!(!out_path.exists());
    }

    #[test]
    fn test_diagnostics_are_collected() {
        let program = source::parse_source(
            "pub struct T; impl T { pub fn f(&self, widget: Vec<u8>) -> Result<(), String> { Ok(()) } }",
        )
        .unwrap();
        let generated = Generator::new(GenerateConfig::default())
            .render(&program, &targets(&["T:THttp"]))
            .unwrap();

        assert_eq!(generated.diagnostics.len(), 1);
        assert_eq!(generated.diagnostics[0].0, "THttp");
        assert_eq!(generated.diagnostics[0].1.param.as_deref(), Some("widget"));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let generator = Generator::new(GenerateConfig::default());
        let program = Program::new();

        assert!(matches!(
            generator.render(&program, &[]),
            Err(RuntimeError::NoTargets)
        ));

        let mut program = Program::new();
        program.declare("T");
        assert!(matches!(
            generator.render(&program, &targets(&["T:A", "T:A"])),
            Err(RuntimeError::DuplicateAdapter(name)) if name == "A"
        ));

        let unsupported = Generator::new(GenerateConfig::default()).source("program.yaml");
        assert!(matches!(
            unsupported.load_program(&Output::Stdout),
            Err(RuntimeError::UnsupportedSource(_))
        ));
    }

    #[test]
    fn test_source_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.rs");
        fs::write(&path, "pub struct {").unwrap();

        let err = Generator::new(GenerateConfig::default())
            .source(&path)
            .load_program(&Output::Stdout)
            .unwrap_err();
        assert!(err.to_string().contains("broken.rs"));
    }
}
