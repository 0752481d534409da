//! # httper Core
//!
//! The generation-time engine of httper.
//!
//! Given the exported methods of a "backend" type, this crate decides, per
//! parameter, where a handler argument comes from (the **binding plan**) and
//! renders an adapter type exposing every method as an HTTP handler.
//!
//! ## Pipeline
//!
//! ```text
//! ┌───────────────┐     ┌────────────┐     ┌──────────────┐     ┌─────────────┐
//! │ ProgramModel  │────▶│  Planner   │────▶│ AdapterPlan  │────▶│ Synthesizer │──▶ Rust source
//! │ (syn / JSON)  │     │ +Classifier│     │ +Finalizers  │     │ (quote)     │
//! └───────────────┘     └────────────┘     └──────────────┘     └─────────────┘
//! ```
//!
//! - [`model`]: method/parameter descriptors and the [`ProgramModel`] collaborator
//! - [`source`]: builds a [`Program`] from Rust sources with `syn`
//! - [`classify`]: the naming-convention classifier (`getName` → facet `get`)
//! - [`plan`]: per-parameter binding strategies and the per-type [`AdapterPlan`]
//! - [`finalizer`]: static detection of backend-provided finalizers
//! - [`synth`]: renders adapters as token streams
//!
//! ## Example
//!
//! ```rust,ignore
//! use httper_core::{GenerateConfig, Mode, Target, plan_adapter, source, synth};
//!
//! let program = source::parse_source(include_str!("controller.rs"))?;
//! let config = GenerateConfig::new(Mode::Extended);
//! let target: Target = "Controller:ControllerHttp".parse()?;
//!
//! let plan = plan_adapter(&program, &target, &config)?;
//! let tokens = synth::Synthesizer::new(&config)?.adapter(&plan)?;
//! println!("{}", synth::render_file(&[tokens], &config.runtime_path)?);
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod finalizer;
pub mod model;
pub mod plan;
pub mod source;
pub mod synth;

pub use classify::{Classification, classify, classify_param};
pub use config::{GenerateConfig, ReservedNames};
pub use error::{GenerateError, GenerateResult};
pub use finalizer::{FinalizerSupport, HANDLE_ERROR, HANDLE_SUCCESS, detect};
pub use model::{MethodDescriptor, ParamDescriptor, ParamShape, Program, ProgramModel, TypeDescriptor};
pub use plan::{
    AdapterPlan, BindingPlanEntry, BindingStrategy, Coercion, Diagnostic, MethodPlan, Target, plan,
    plan_adapter,
};
pub use synth::{Synthesizer, render_file};

pub use httper_framework::{FacetKind, Mode};
