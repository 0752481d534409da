//! Finalizer capability detection.
//!
//! Resolved once per generation run from the backend's declared methods. The
//! emitted adapter then either delegates to the backend or embeds the default
//! finalization logic; nothing is decided at request time.

use tracing::debug;

use crate::error::{GenerateError, GenerateResult};
use crate::model::TypeDescriptor;

/// Name of the error finalizer method.
pub const HANDLE_ERROR: &str = "handle_error";

/// Name of the success finalizer method.
pub const HANDLE_SUCCESS: &str = "handle_success";

/// `handle_error(err, w, r)`.
const HANDLE_ERROR_ARITY: usize = 3;

/// `handle_success(w, body)`.
const HANDLE_SUCCESS_ARITY: usize = 2;

/// Which finalizers the backend provides itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinalizerSupport {
    /// The backend declares `handle_error`.
    pub error: bool,
    /// The backend declares `handle_success`.
    pub success: bool,
}

impl FinalizerSupport {
    /// Returns `true` when both finalizers come from the backend.
    pub fn embedded(&self) -> bool {
        self.error && self.success
    }
}

/// Returns `true` for the two finalizer method names.
pub fn is_finalizer(name: &str) -> bool {
    name == HANDLE_ERROR || name == HANDLE_SUCCESS
}

/// Detects the finalizers declared on `ty`.
///
/// A method carrying a finalizer name but the wrong parameter count is
/// rejected rather than ignored.
pub fn detect(ty: &TypeDescriptor) -> GenerateResult<FinalizerSupport> {
    let support = FinalizerSupport {
        error: declares(ty, HANDLE_ERROR, HANDLE_ERROR_ARITY)?,
        success: declares(ty, HANDLE_SUCCESS, HANDLE_SUCCESS_ARITY)?,
    };
    debug!(
        type_name = %ty.name,
        error = support.error,
        success = support.success,
        "Detected backend finalizers"
    );
    Ok(support)
}

fn declares(ty: &TypeDescriptor, name: &'static str, arity: usize) -> GenerateResult<bool> {
    let Some(method) = ty.method(name) else {
        return Ok(false);
    };
    if method.arity() != arity {
        return Err(GenerateError::FinalizerShape {
            type_name: ty.name.clone(),
            method: name,
            expected: arity,
            found: method.arity(),
        });
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MethodDescriptor, ParamShape};

    fn backend(methods: Vec<MethodDescriptor>) -> TypeDescriptor {
        TypeDescriptor {
            name: "Controller".into(),
            methods,
            docs: vec![],
        }
    }

    fn handle_error() -> MethodDescriptor {
        MethodDescriptor::new(HANDLE_ERROR)
            .without_result()
            .param("err", "&dyn Display", ParamShape::Opaque)
            .param("w", "&mut HttpResponse", ParamShape::ResponseWriter)
            .param("r", "&HttpRequest", ParamShape::Request)
    }

    fn handle_success() -> MethodDescriptor {
        MethodDescriptor::new(HANDLE_SUCCESS)
            .param("w", "&mut HttpResponse", ParamShape::ResponseWriter)
            .param("body", "&mut dyn Read", ParamShape::Opaque)
    }

    #[test]
    fn test_detect_none() {
        let support = detect(&backend(vec![MethodDescriptor::new("get_by_id")])).unwrap();
        assert_eq!(support, FinalizerSupport::default());
        assert!(!support.embedded());
    }

    #[test]
    fn test_detect_each_independently() {
        let support = detect(&backend(vec![handle_error()])).unwrap();
        assert!(support.error);
        assert!(!support.success);

        let support = detect(&backend(vec![handle_error(), handle_success()])).unwrap();
        assert!(support.embedded());
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        let bad = MethodDescriptor::new(HANDLE_SUCCESS).param("w", "&mut HttpResponse", ParamShape::ResponseWriter);
        let err = detect(&backend(vec![bad])).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::FinalizerShape {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }
}
