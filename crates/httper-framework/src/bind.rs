//! Helpers called by generated handlers.

use std::fmt::Display;
use std::str::FromStr;

use crate::error::{BindError, BindResult};
use crate::request::HttpRequest;
use crate::response::HttpResponse;

/// A generated handler method on adapter `A`.
pub type Handler<A> = fn(&A, &mut HttpResponse, &mut HttpRequest);

/// Parses a resolved value as `T`.
///
/// An absent value parses as the empty string, so a missing integer fails the
/// same way as a malformed one. Surrounding whitespace is not stripped.
///
/// # Example
///
/// ```
/// use httper_framework::coerce;
///
/// assert_eq!(coerce::<i64>("urlID", Some("42".into())), Ok(42));
/// assert!(coerce::<i64>("urlID", Some("abc".into())).is_err());
/// assert!(coerce::<u8>("getAge", None).is_err());
/// ```
pub fn coerce<T>(param: &'static str, raw: Option<String>) -> BindResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    let value = raw.unwrap_or_default();
    let parsed = value.parse::<T>();
    parsed.map_err(|err| BindError::Coerce {
        param,
        reason: err.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_integer() {
        assert_eq!(coerce::<i32>("getCount", Some("-7".into())), Ok(-7));
        assert_eq!(coerce::<u64>("urlID", Some("42".into())), Ok(42));
    }

    #[test]
    fn test_coerce_failure() {
        let err = coerce::<u8>("getAge", Some("300".into())).unwrap_err();
        assert!(matches!(err, BindError::Coerce { param: "getAge", .. }));
        assert!(err.to_string().starts_with("invalid value \"300\" for 'getAge'"));

        let err = coerce::<i64>("urlID", Some(" 5 ".into())).unwrap_err();
        assert!(matches!(err, BindError::Coerce { ref value, .. } if value == " 5 "));

        let err = coerce::<i64>("urlID", None).unwrap_err();
        assert!(matches!(err, BindError::Coerce { ref value, .. } if value.is_empty()));
    }
}
