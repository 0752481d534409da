//! Facets: the request data sources a parameter can be bound to.
//!
//! A facet answers two questions: does it claim a prefix, and what value does
//! it hold under a name. Facets are built per request and only borrow from it.
//!
//! | Prefix    | Source                                   | Mode     |
//! |-----------|------------------------------------------|----------|
//! | `get`     | query string                             | minimal  |
//! | `post`    | url-encoded form body                    | minimal  |
//! | `cookie`  | request cookies                          | minimal  |
//! | `req`     | query string, then form body             | minimal  |
//! | `url`     | query string, then route variables       | extended |
//! | `route`   | route variables                          | extended |
//! | `session` | session store                            | extended |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BindError;
use crate::request::HttpRequest;
use crate::session::Session;

// =============================================================================
// Facet kinds and modes
// =============================================================================

/// The seven facets, named by their prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetKind {
    /// Query string.
    Get,
    /// Url-encoded form body.
    Post,
    /// Query string, then form body.
    Req,
    /// Request cookies.
    Cookie,
    /// Query string, then route variables.
    Url,
    /// Route variables.
    Route,
    /// Session store.
    Session,
}

impl FacetKind {
    /// All facets, in extended chain order.
    pub const ALL: [FacetKind; 7] = [
        FacetKind::Get,
        FacetKind::Post,
        FacetKind::Cookie,
        FacetKind::Req,
        FacetKind::Url,
        FacetKind::Route,
        FacetKind::Session,
    ];

    /// The lower-case prefix this facet claims.
    pub const fn prefix(self) -> &'static str {
        match self {
            FacetKind::Get => "get",
            FacetKind::Post => "post",
            FacetKind::Req => "req",
            FacetKind::Cookie => "cookie",
            FacetKind::Url => "url",
            FacetKind::Route => "route",
            FacetKind::Session => "session",
        }
    }

    /// Looks a facet up by its prefix.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.prefix() == prefix)
    }
}

impl fmt::Display for FacetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Selects the facet set and the session wiring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Query, form and cookie facets; sessions are void.
    #[default]
    #[serde(alias = "std")]
    Minimal,
    /// Minimal facets plus route variables and sessions.
    #[serde(alias = "gorilla")]
    Extended,
}

const MINIMAL_FACETS: &[FacetKind] = &[
    FacetKind::Get,
    FacetKind::Post,
    FacetKind::Cookie,
    FacetKind::Req,
];

const EXTENDED_FACETS: &[FacetKind] = &FacetKind::ALL;

impl Mode {
    /// Facets of this mode, in chain order.
    pub const fn facets(self) -> &'static [FacetKind] {
        match self {
            Mode::Minimal => MINIMAL_FACETS,
            Mode::Extended => EXTENDED_FACETS,
        }
    }

    /// The canonical mode name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Mode::Minimal => "minimal",
            Mode::Extended => "extended",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minimal" | "std" => Ok(Mode::Minimal),
            "extended" | "gorilla" => Ok(Mode::Extended),
            other => Err(BindError::UnknownMode(other.to_string())),
        }
    }
}

// =============================================================================
// Runtime facets
// =============================================================================

/// A value found by a facet.
#[derive(Debug, Clone, PartialEq)]
pub enum FacetValue {
    /// Text from the query, form, cookies or route.
    Text(String),
    /// A stored session value.
    Value(Value),
}

impl FacetValue {
    /// Whether the value counts as found: non-empty text or a non-null value.
    pub fn is_present(&self) -> bool {
        match self {
            FacetValue::Text(text) => !text.is_empty(),
            FacetValue::Value(value) => !value.is_null(),
        }
    }

    /// Converts to text; session strings are unquoted, other values rendered
    /// as JSON.
    pub fn into_text(self) -> String {
        match self {
            FacetValue::Text(text) => text,
            FacetValue::Value(Value::String(text)) => text,
            FacetValue::Value(value) => value.to_string(),
        }
    }
}

/// A facet bound to one request.
#[derive(Debug)]
pub enum Facet<'r> {
    /// Query string.
    Get(&'r HttpRequest),
    /// Form body.
    Post(&'r HttpRequest),
    /// Query, then form.
    Req(&'r HttpRequest),
    /// Cookies.
    Cookie(&'r HttpRequest),
    /// Query, then route variables.
    Url(&'r HttpRequest),
    /// Route variables.
    Route(&'r HttpRequest),
    /// Session values.
    Session(Session),
}

impl<'r> Facet<'r> {
    /// Binds `kind` to a request.
    ///
    /// The session facet needs a session handle and is built with
    /// [`Facet::Session`] directly.
    pub fn new(kind: FacetKind, r: &'r HttpRequest) -> Option<Self> {
        Some(match kind {
            FacetKind::Get => Facet::Get(r),
            FacetKind::Post => Facet::Post(r),
            FacetKind::Req => Facet::Req(r),
            FacetKind::Cookie => Facet::Cookie(r),
            FacetKind::Url => Facet::Url(r),
            FacetKind::Route => Facet::Route(r),
            FacetKind::Session => return None,
        })
    }

    /// The facet kind.
    pub fn kind(&self) -> FacetKind {
        match self {
            Facet::Get(_) => FacetKind::Get,
            Facet::Post(_) => FacetKind::Post,
            Facet::Req(_) => FacetKind::Req,
            Facet::Cookie(_) => FacetKind::Cookie,
            Facet::Url(_) => FacetKind::Url,
            Facet::Route(_) => FacetKind::Route,
            Facet::Session(_) => FacetKind::Session,
        }
    }

    /// Whether this facet answers for `prefix`.
    pub fn claims(&self, prefix: FacetKind) -> bool {
        self.kind() == prefix
    }

    /// Looks `name` up. Absence is `None`, never an empty placeholder.
    pub fn get(&self, name: &str) -> Option<FacetValue> {
        let text = match self {
            Facet::Get(r) => r.query(name),
            Facet::Post(r) => r.form(name),
            Facet::Req(r) => first_present(r.query(name), || r.form(name)),
            Facet::Cookie(r) => r.cookie(name),
            Facet::Url(r) => first_present(r.query(name), || r.path_var(name)),
            Facet::Route(r) => r.path_var(name),
            Facet::Session(session) => return session.get(name).map(FacetValue::Value),
        };
        text.map(|t| FacetValue::Text(t.to_string()))
    }
}

/// A key present in the first source wins, even with an empty value.
fn first_present<'a>(first: Option<&'a str>, then: impl FnOnce() -> Option<&'a str>) -> Option<&'a str> {
    first.or_else(then)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_facets() {
        assert_eq!(
            Mode::Minimal.facets(),
            &[FacetKind::Get, FacetKind::Post, FacetKind::Cookie, FacetKind::Req]
        );
        assert_eq!(Mode::Extended.facets().len(), 7);
        assert_eq!(&Mode::Extended.facets()[..4], Mode::Minimal.facets());
    }

    #[test]
    fn test_mode_names() {
        assert_eq!("gorilla".parse::<Mode>().unwrap(), Mode::Extended);
        assert_eq!("std".parse::<Mode>().unwrap(), Mode::Minimal);
        assert!("echo".parse::<Mode>().is_err());

        let mode: Mode = serde_json::from_str("\"gorilla\"").unwrap();
        assert_eq!(mode, Mode::Extended);
        assert_eq!(serde_json::to_string(&Mode::Minimal).unwrap(), "\"minimal\"");
    }

    #[test]
    fn test_prefix_round_trip() {
        for kind in FacetKind::ALL {
            assert_eq!(FacetKind::from_prefix(kind.prefix()), Some(kind));
        }
        assert_eq!(FacetKind::from_prefix("header"), None);
    }

    #[test]
    fn test_merged_facets() {
        let r = HttpRequest::builder()
            .uri("/tomatoes?id=&color=red")
            .path_var("id", "7")
            .build();

        assert_eq!(Facet::Url(&r).get("id"), Some(FacetValue::Text(String::new())));
        assert_eq!(Facet::Url(&r).get("name"), None);
        assert_eq!(Facet::Get(&r).get("id"), Some(FacetValue::Text(String::new())));
        assert_eq!(
            Facet::Route(&r).get("color"),
            None
        );
        assert_eq!(
            Facet::Req(&r).get("color"),
            Some(FacetValue::Text("red".into()))
        );
    }

    #[test]
    fn test_query_key_wins_even_when_empty() {
        let r = HttpRequest::builder()
            .uri("/tomatoes?id=")
            .form([("id", "5"), ("name", "Roma")])
            .path_var("name", "Cherry")
            .build();

        assert_eq!(Facet::Req(&r).get("id"), Some(FacetValue::Text(String::new())));
        assert_eq!(Facet::Req(&r).get("name"), Some(FacetValue::Text("Roma".into())));
        assert_eq!(Facet::Url(&r).get("name"), Some(FacetValue::Text("Cherry".into())));
    }

    #[test]
    fn test_presence() {
        assert!(!FacetValue::Text(String::new()).is_present());
        assert!(!FacetValue::Value(Value::Null).is_present());
        assert!(FacetValue::Value(Value::String(String::new())).is_present());
        assert_eq!(FacetValue::Value(serde_json::json!(3)).into_text(), "3");
    }
}
