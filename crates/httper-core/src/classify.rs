//! Naming-convention classifier.
//!
//! A parameter is bound to a facet when its identifier starts with the facet
//! prefix and a case transition marks the word boundary:
//!
//! | Identifier | Facet | Lookup key |
//! |------------|-------|------------|
//! | `getName`  | `get` | `name`     |
//! | `GETid`    | `get` | `id`       |
//! | `urlID`    | `url` | `id`       |
//! | `postalCode` | none | -         |
//!
//! With snake-case boundaries enabled, `get_name` also classifies to `get`.

use httper_framework::FacetKind;

/// A facet claim on a parameter identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// The claiming facet.
    pub facet: FacetKind,
    /// Identifier with the prefix stripped, lower-cased.
    pub key: String,
}

/// Returns the first facet, in chain order, whose prefix `identifier` encodes.
pub fn classify(identifier: &str, facets: &[FacetKind]) -> Option<FacetKind> {
    classify_param(identifier, facets, false).map(|c| c.facet)
}

/// Classifies `identifier` and derives its lookup key.
pub fn classify_param(
    identifier: &str,
    facets: &[FacetKind],
    snake_case_boundaries: bool,
) -> Option<Classification> {
    facets.iter().find_map(|&facet| {
        boundary(identifier, facet.prefix(), snake_case_boundaries).map(|rest| Classification {
            facet,
            key: rest.to_lowercase(),
        })
    })
}

/// Returns the remainder after `prefix` when a word boundary follows it.
fn boundary<'a>(identifier: &'a str, prefix: &str, snake_case: bool) -> Option<&'a str> {
    if let Some(rest) = identifier.strip_prefix(prefix) {
        let next = rest.chars().next()?;
        if next.is_uppercase() {
            return Some(rest);
        }
        if snake_case && next == '_' {
            return Some(&rest[1..]).filter(|key| !key.is_empty());
        }
        return None;
    }

    let upper = prefix.to_uppercase();
    let rest = identifier.strip_prefix(upper.as_str())?;
    rest.chars()
        .next()
        .filter(|next| next.is_lowercase())
        .map(|_| rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httper_framework::Mode;

    const MINIMAL: &[FacetKind] = Mode::Minimal.facets();
    const EXTENDED: &[FacetKind] = Mode::Extended.facets();

    #[test]
    fn test_lower_prefix_upper_boundary() {
        assert_eq!(classify("getName", MINIMAL), Some(FacetKind::Get));
        assert_eq!(classify("postTitle", MINIMAL), Some(FacetKind::Post));
        assert_eq!(classify("cookieToken", MINIMAL), Some(FacetKind::Cookie));
        assert_eq!(classify("reqId", MINIMAL), Some(FacetKind::Req));
    }

    #[test]
    fn test_upper_prefix_lower_boundary() {
        assert_eq!(classify("GETid", MINIMAL), Some(FacetKind::Get));
        assert_eq!(classify("REQid", MINIMAL), Some(FacetKind::Req));
        assert_eq!(classify("GETID", MINIMAL), None);
    }

    #[test]
    fn test_no_boundary_no_match() {
        assert_eq!(classify("postalCode", MINIMAL), None);
        assert_eq!(classify("getter", MINIMAL), None);
        assert_eq!(classify("get", MINIMAL), None);
        assert_eq!(classify("get1", MINIMAL), None);
        assert_eq!(classify("name", MINIMAL), None);
    }

    #[test]
    fn test_mode_decides_facet_set() {
        assert_eq!(classify("urlID", MINIMAL), None);
        assert_eq!(classify("urlID", EXTENDED), Some(FacetKind::Url));
        assert_eq!(classify("routeSlug", EXTENDED), Some(FacetKind::Route));
        assert_eq!(classify("sessionUser", EXTENDED), Some(FacetKind::Session));
    }

    #[test]
    fn test_lookup_key() {
        let c = classify_param("urlID", EXTENDED, false).unwrap();
        assert_eq!(c.facet, FacetKind::Url);
        assert_eq!(c.key, "id");

        let c = classify_param("GETUserName", MINIMAL, false);
        assert!(c.is_none());

        let c = classify_param("getUserName", MINIMAL, false).unwrap();
        assert_eq!(c.key, "username");
    }

    #[test]
    fn test_snake_case_boundaries() {
        assert!(classify_param("get_name", MINIMAL, false).is_none());

        let c = classify_param("get_user_name", MINIMAL, true).unwrap();
        assert_eq!(c.facet, FacetKind::Get);
        assert_eq!(c.key, "user_name");

        assert!(classify_param("get_", MINIMAL, true).is_none());
        assert!(classify_param("postal_code", MINIMAL, true).is_none());
    }
}
