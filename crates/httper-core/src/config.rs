//! Generation configuration.
//!
//! [`GenerateConfig`] is passed explicitly to the planner and the synthesizer;
//! there is no process-wide mode state.

use serde::{Deserialize, Serialize};

use crate::error::{GenerateError, GenerateResult};
use httper_framework::{FacetKind, Mode};

/// Parameter identifiers with a reserved meaning.
///
/// Renaming a parameter away from one of these silently changes how it is
/// bound; near misses are not detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedNames {
    /// Receives the unread request body.
    #[serde(default = "default_raw_body")]
    pub raw_body: String,
    /// Receives the handler's response writer.
    #[serde(default = "default_writer")]
    pub writer: String,
    /// Receives the handler's request.
    #[serde(default = "default_request")]
    pub request: String,
}

impl Default for ReservedNames {
    fn default() -> Self {
        Self {
            raw_body: default_raw_body(),
            writer: default_writer(),
            request: default_request(),
        }
    }
}

fn default_raw_body() -> String {
    "req_body".to_string()
}

fn default_writer() -> String {
    "w".to_string()
}

fn default_request() -> String {
    "r".to_string()
}

fn default_runtime_path() -> String {
    "::httper_framework".to_string()
}

/// Configuration record for one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// Selects the facet set and the session wiring.
    #[serde(default)]
    pub mode: Mode,

    /// Reserved parameter identifiers.
    #[serde(default)]
    pub reserved: ReservedNames,

    /// Also accept `prefix_name` as a convention boundary.
    #[serde(default)]
    pub snake_case_boundaries: bool,

    /// Reject parameters that no strategy can bind.
    #[serde(default)]
    pub strict_unbound: bool,

    /// Path of the runtime crate in emitted code.
    #[serde(default = "default_runtime_path")]
    pub runtime_path: String,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self::new(Mode::default())
    }
}

impl GenerateConfig {
    /// Creates a configuration for `mode` with default settings.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            reserved: ReservedNames::default(),
            snake_case_boundaries: false,
            strict_unbound: false,
            runtime_path: default_runtime_path(),
        }
    }

    /// Enables `prefix_name` boundaries.
    pub fn with_snake_case_boundaries(mut self, enabled: bool) -> Self {
        self.snake_case_boundaries = enabled;
        self
    }

    /// Makes unbound parameters fatal.
    pub fn with_strict_unbound(mut self, enabled: bool) -> Self {
        self.strict_unbound = enabled;
        self
    }

    /// Sets the runtime crate path used by emitted code.
    pub fn with_runtime_path(mut self, path: impl Into<String>) -> Self {
        self.runtime_path = path.into();
        self
    }

    /// Facets visible to the classifier, in chain order.
    pub fn facets(&self) -> &'static [FacetKind] {
        self.mode.facets()
    }

    /// Parses [`runtime_path`](Self::runtime_path).
    pub fn parse_runtime_path(&self) -> GenerateResult<syn::Path> {
        syn::parse_str(&self.runtime_path)
            .map_err(|_| GenerateError::InvalidRuntimePath(self.runtime_path.clone()))
    }
}
