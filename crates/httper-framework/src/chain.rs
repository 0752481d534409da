//! Provider chain: ordered facets resolving `(prefix, name)` lookups.

use tracing::trace;

use crate::facet::{Facet, FacetKind, FacetValue, Mode};
use crate::request::HttpRequest;
use crate::session::SessionConfig;

/// Facets bound to one request, queried in order.
///
/// Every facet claiming the prefix is asked in turn; the first present value
/// wins. Empty text and null values count as absent.
#[derive(Debug)]
pub struct ProviderChain<'r> {
    facets: Vec<Facet<'r>>,
}

impl<'r> ProviderChain<'r> {
    /// Builds a chain from facets in lookup order.
    pub fn new(facets: Vec<Facet<'r>>) -> Self {
        Self { facets }
    }

    /// Kinds of the facets, in lookup order.
    pub fn kinds(&self) -> Vec<FacetKind> {
        self.facets.iter().map(Facet::kind).collect()
    }

    /// Resolves `name` under `prefix`.
    pub fn get(&self, prefix: FacetKind, name: &str) -> Option<FacetValue> {
        let found = self
            .facets
            .iter()
            .filter(|facet| facet.claims(prefix))
            .find_map(|facet| facet.get(name).filter(FacetValue::is_present));
        trace!(%prefix, name, found = found.is_some(), "Resolved facet value");
        found
    }

    /// Resolves `name` under `prefix` as text.
    pub fn get_text(&self, prefix: FacetKind, name: &str) -> Option<String> {
        self.get(prefix, name).map(FacetValue::into_text)
    }
}

/// Makes a [`ProviderChain`] per request for a mode.
#[derive(Debug, Clone, Default)]
pub struct DataProvider {
    mode: Mode,
    sessions: Option<SessionConfig>,
}

impl DataProvider {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            sessions: None,
        }
    }

    /// Configures the session store read by the session facet.
    pub fn with_sessions(mut self, sessions: Option<SessionConfig>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Binds the mode's facets to `r`.
    ///
    /// The session facet is left out entirely when no store is configured.
    pub fn make<'r>(&self, r: &'r HttpRequest) -> ProviderChain<'r> {
        let facets = self
            .mode
            .facets()
            .iter()
            .filter_map(|&kind| match kind {
                FacetKind::Session => self
                    .sessions
                    .as_ref()
                    .map(|config| Facet::Session(config.session(r))),
                kind => Facet::new(kind, r),
            })
            .collect();
        ProviderChain::new(facets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{DEFAULT_SESSION_COOKIE, SessionStore};
    use serde_json::json;

    #[test]
    fn test_minimal_chain() {
        let r = HttpRequest::builder().build();
        let chain = DataProvider::new(Mode::Minimal).make(&r);
        assert_eq!(chain.kinds(), Mode::Minimal.facets());
    }

    #[test]
    fn test_session_facet_needs_a_store() {
        let r = HttpRequest::builder().build();

        let chain = DataProvider::new(Mode::Extended).make(&r);
        assert!(!chain.kinds().contains(&FacetKind::Session));
        assert_eq!(chain.kinds().len(), 6);

        let chain = DataProvider::new(Mode::Extended)
            .with_sessions(Some(SessionConfig::in_memory()))
            .make(&r);
        assert_eq!(chain.kinds(), Mode::Extended.facets());
    }

    #[test]
    fn test_resolves_by_prefix() {
        let r = HttpRequest::builder()
            .uri("/tomatoes?id=&name=cherry")
            .path_var("id", "7")
            .cookie("token", "t0k")
            .build();
        let chain = DataProvider::new(Mode::Extended).make(&r);

        // The empty query value shadows the route variable.
        assert_eq!(chain.get_text(FacetKind::Url, "id"), None);
        assert_eq!(chain.get_text(FacetKind::Route, "id").as_deref(), Some("7"));
        assert_eq!(chain.get_text(FacetKind::Get, "id"), None);
        assert_eq!(chain.get_text(FacetKind::Get, "name").as_deref(), Some("cherry"));
        assert_eq!(chain.get_text(FacetKind::Cookie, "token").as_deref(), Some("t0k"));
        assert_eq!(chain.get_text(FacetKind::Post, "name"), None);
    }

    #[test]
    fn test_session_lookup() {
        let config = SessionConfig::in_memory();
        config.store.set("s1", "user", json!("ana"));
        config.store.set("s1", "blank", json!(null));

        let r = HttpRequest::builder().cookie(DEFAULT_SESSION_COOKIE, "s1").build();
        let chain = DataProvider::new(Mode::Extended)
            .with_sessions(Some(config))
            .make(&r);

        assert_eq!(chain.get_text(FacetKind::Session, "user").as_deref(), Some("ana"));
        assert_eq!(chain.get(FacetKind::Session, "blank"), None);
        assert_eq!(chain.get(FacetKind::Session, "missing"), None);
    }

    #[test]
    fn test_first_present_duplicate_wins() {
        let first = HttpRequest::builder().uri("/?a=").build();
        let second = HttpRequest::builder().uri("/?a=2").build();
        let chain = ProviderChain::new(vec![Facet::Get(&first), Facet::Get(&second)]);

        assert_eq!(chain.get_text(FacetKind::Get, "a").as_deref(), Some("2"));
    }
}
