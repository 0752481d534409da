//! Binding planner.
//!
//! For every parameter of every exported method, the planner picks exactly one
//! [`BindingStrategy`]. The first matching rule wins:
//!
//! 1. identifier is the reserved raw-body name → [`RawBody`](BindingStrategy::RawBody)
//! 2. shape is `CookieJar` → [`CookieInjection`](BindingStrategy::CookieInjection)
//! 3. writer/request shape under its reserved name → [`ContextPassthrough`](BindingStrategy::ContextPassthrough)
//! 4. shape is `Session` → [`SessionInjection`](BindingStrategy::SessionInjection)
//! 5. identifier encodes a facet and the shape is text or integer → [`ConventionBound`](BindingStrategy::ConventionBound)
//! 6. anything else → [`Unbound`](BindingStrategy::Unbound)
//!
//! Planning is pure: the same descriptor and configuration always yield the
//! same plan, with parameter order preserved.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::classify::classify_param;
use crate::config::GenerateConfig;
use crate::error::{GenerateError, GenerateResult};
use crate::finalizer::{self, FinalizerSupport};
use crate::model::{MethodDescriptor, ParamDescriptor, ParamShape, ProgramModel};
use crate::source::base_type_name;
use httper_framework::FacetKind;

/// Method names the adapter defines itself.
const ADAPTER_ITEMS: &[&str] = &["new", "embed"];

// =============================================================================
// Binding plan
// =============================================================================

/// How a resolved text value becomes the parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// The text is used as is.
    Identity,
    /// The text is parsed as the declared integer type.
    ParseInt,
}

/// Where a handler argument comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingStrategy {
    /// The unread request body.
    RawBody,
    /// A cookie jar made from the request.
    CookieInjection,
    /// A session handle made from the request.
    SessionInjection,
    /// The handler's own writer or request argument.
    ContextPassthrough,
    /// A value resolved through the provider chain.
    ConventionBound {
        /// Facet named by the identifier prefix.
        facet: FacetKind,
        /// Lookup key passed to the facet.
        key: String,
        /// Conversion applied to the resolved text.
        coercion: Coercion,
    },
    /// No strategy applies; the argument is default-valued.
    Unbound,
}

/// One planned parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingPlanEntry {
    /// The parameter being bound.
    pub param: ParamDescriptor,
    /// The chosen strategy.
    pub strategy: BindingStrategy,
}

/// The binding plan of one method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodPlan {
    /// Method name.
    pub name: String,
    /// Entries in declaration order.
    pub entries: Vec<BindingPlanEntry>,
    /// Documentation lines of the backend method.
    pub docs: Vec<String>,
}

impl MethodPlan {
    /// Entries no strategy could bind.
    pub fn unbound(&self) -> impl Iterator<Item = &BindingPlanEntry> {
        self.entries
            .iter()
            .filter(|e| e.strategy == BindingStrategy::Unbound)
    }

    /// Returns `true` if any entry resolves through the provider chain.
    pub fn uses_provider_chain(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.strategy, BindingStrategy::ConventionBound { .. }))
    }
}

/// Plans every parameter of `method`.
pub fn plan(method: &MethodDescriptor, config: &GenerateConfig) -> MethodPlan {
    let entries = method
        .params
        .iter()
        .map(|param| BindingPlanEntry {
            param: param.clone(),
            strategy: plan_param(param, config),
        })
        .collect();

    MethodPlan {
        name: method.name.clone(),
        entries,
        docs: method.docs.clone(),
    }
}

fn plan_param(param: &ParamDescriptor, config: &GenerateConfig) -> BindingStrategy {
    let reserved = &config.reserved;
    let name = param.name.as_str();

    if name == reserved.raw_body {
        return BindingStrategy::RawBody;
    }
    if param.shape == ParamShape::CookieAccessor {
        return BindingStrategy::CookieInjection;
    }
    if (param.shape == ParamShape::ResponseWriter && name == reserved.writer)
        || (param.shape == ParamShape::Request && name == reserved.request)
    {
        return BindingStrategy::ContextPassthrough;
    }
    if param.shape == ParamShape::SessionAccessor {
        return BindingStrategy::SessionInjection;
    }

    let coercion = match param.shape {
        ParamShape::Text => Coercion::Identity,
        ParamShape::Integer => Coercion::ParseInt,
        _ => return BindingStrategy::Unbound,
    };
    match classify_param(name, config.facets(), config.snake_case_boundaries) {
        Some(c) => BindingStrategy::ConventionBound {
            facet: c.facet,
            key: c.key,
            coercion,
        },
        None => BindingStrategy::Unbound,
    }
}

// =============================================================================
// Targets
// =============================================================================

/// A `src:dst` pair: the backend type expression and the adapter name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Backend type as written, e.g. `Arc<Controller>`.
    pub src: String,
    /// Adapter type name, e.g. `ControllerHttp`.
    pub dst: String,
}

impl Target {
    /// Creates a target.
    pub fn new(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
        }
    }

    /// Parses [`src`](Self::src) as a Rust type.
    pub fn src_type(&self) -> GenerateResult<syn::Type> {
        syn::parse_str(&self.src).map_err(|e| GenerateError::invalid_type(&self.src, &e))
    }

    /// The declared type name behind references and smart pointers.
    pub fn src_name(&self) -> GenerateResult<String> {
        let ty = self.src_type()?;
        base_type_name(&ty).ok_or_else(|| GenerateError::InvalidType {
            ty: self.src.clone(),
            reason: "not a named type".into(),
        })
    }
}

impl FromStr for Target {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once(':') {
            Some((src, dst)) if !src.trim().is_empty() && !dst.trim().is_empty() => {
                Ok(Self::new(src.trim(), dst.trim()))
            }
            _ => Err(GenerateError::InvalidTarget(s.to_string())),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.src, self.dst)
    }
}

// =============================================================================
// Adapter plan
// =============================================================================

/// A generation-time finding reported to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Method concerned.
    pub method: String,
    /// Parameter concerned, if any.
    pub param: Option<String>,
    /// Human-readable message.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.param {
            Some(param) => write!(f, "{}({}): {}", self.method, param, self.message),
            None => write!(f, "{}: {}", self.method, self.message),
        }
    }
}

/// Everything the synthesizer needs to render one adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterPlan {
    /// The `src:dst` pair.
    pub target: Target,
    /// Declared name of the backend type.
    pub src_name: String,
    /// Finalizers provided by the backend.
    pub finalizers: FinalizerSupport,
    /// Planned handlers in declaration order.
    pub methods: Vec<MethodPlan>,
    /// Findings collected while planning.
    pub diagnostics: Vec<Diagnostic>,
}

/// Plans the adapter for `target`.
///
/// Unexported methods, methods without a `Result` return and the finalizer
/// methods never become handlers.
pub fn plan_adapter<P: ProgramModel + ?Sized>(
    program: &P,
    target: &Target,
    config: &GenerateConfig,
) -> GenerateResult<AdapterPlan> {
    let src_name = target.src_name()?;
    let ty = program
        .lookup(&src_name)
        .ok_or_else(|| GenerateError::UnknownType(src_name.clone()))?;
    let finalizers = finalizer::detect(ty)?;

    let mut methods = Vec::new();
    let mut diagnostics = Vec::new();

    for method in &ty.methods {
        if !method.exported || finalizer::is_finalizer(&method.name) {
            continue;
        }
        if !method.returns_result {
            debug!(method = %method.name, "Skipping method without a Result return");
            diagnostics.push(Diagnostic {
                method: method.name.clone(),
                param: None,
                message: "skipped: the return type is not a Result".into(),
            });
            continue;
        }
        if ADAPTER_ITEMS.contains(&method.name.as_str()) {
            diagnostics.push(Diagnostic {
                method: method.name.clone(),
                param: None,
                message: "skipped: the name collides with an adapter item".into(),
            });
            continue;
        }

        let planned = plan(method, config);
        for entry in planned.unbound() {
            let reason = unbound_reason(&entry.param, config);
            if config.strict_unbound {
                return Err(GenerateError::Unbound {
                    method: method.name.clone(),
                    param: entry.param.name.clone(),
                    reason,
                });
            }
            warn!(
                adapter = %target.dst,
                method = %method.name,
                param = %entry.param.name,
                "{reason}"
            );
            diagnostics.push(Diagnostic {
                method: method.name.clone(),
                param: Some(entry.param.name.clone()),
                message: reason,
            });
        }
        debug!(method = %method.name, params = planned.entries.len(), "Planned handler");
        methods.push(planned);
    }

    Ok(AdapterPlan {
        target: target.clone(),
        src_name,
        finalizers,
        methods,
        diagnostics,
    })
}

fn unbound_reason(param: &ParamDescriptor, config: &GenerateConfig) -> String {
    match classify_param(&param.name, config.facets(), config.snake_case_boundaries) {
        Some(c) => format!(
            "names facet '{}' but '{}' is neither text nor integer; it will be default-valued",
            c.facet, param.ty
        ),
        None => format!(
            "no facet prefix matches under {} mode; it will be default-valued",
            config.mode
        ),
    }
}
