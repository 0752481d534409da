//! Session accessor and store.
//!
//! Sessions are keyed by an id carried in a cookie. Values live in a
//! [`SessionStore`] shared by every request; the store serializes concurrent
//! access itself.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::cookie::Cookie;
use crate::request::HttpRequest;
use crate::response::HttpResponse;

/// Default name of the session id cookie.
pub const DEFAULT_SESSION_COOKIE: &str = "httper_session";

/// How long [`MemorySessionStore`] keeps a session after its last write.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Storage for session values.
pub trait SessionStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if there is none.
    fn get(&self, session_id: &str, key: &str) -> Option<Value>;

    /// Stores `value` under `key`.
    fn set(&self, session_id: &str, key: &str, value: Value);

    /// Removes `key`, returning the previous value.
    fn remove(&self, session_id: &str, key: &str) -> Option<Value>;
}

#[derive(Debug)]
struct SessionEntry {
    values: HashMap<String, Value>,
    touched: Instant,
}

impl SessionEntry {
    fn is_live(&self, ttl: Duration, now: Instant) -> bool {
        self.touched + ttl > now
    }
}

/// In-process session store.
///
/// A session expires `ttl` after its last write. Expired sessions read as
/// empty and are dropped whenever a new session is created.
#[derive(Debug)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of stored sessions, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Drops expired sessions and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.purge_at(Instant::now())
    }

    fn purge_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, entry| entry.is_live(self.ttl, now));
        let purged = before - sessions.len();
        if purged > 0 {
            debug!(purged, "Dropped expired sessions");
        }
        purged
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, session_id: &str, key: &str) -> Option<Value> {
        let sessions = self.sessions.read();
        let entry = sessions
            .get(session_id)
            .filter(|entry| entry.is_live(self.ttl, Instant::now()))?;
        entry.values.get(key).cloned()
    }

    fn set(&self, session_id: &str, key: &str, value: Value) {
        let now = Instant::now();
        if !self.sessions.read().contains_key(session_id) {
            self.purge_at(now);
        }

        let mut sessions = self.sessions.write();
        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                values: HashMap::new(),
                touched: now,
            });
        if !entry.is_live(self.ttl, now) {
            entry.values.clear();
        }
        entry.values.insert(key.to_string(), value);
        entry.touched = now;
    }

    fn remove(&self, session_id: &str, key: &str) -> Option<Value> {
        let mut sessions = self.sessions.write();
        let entry = sessions.get_mut(session_id)?;
        let live = entry.is_live(self.ttl, Instant::now());
        let previous = entry.values.remove(key).filter(|_| live);
        if entry.values.is_empty() || !live {
            sessions.remove(session_id);
        }
        previous
    }
}

/// Where sessions are stored and how their id travels.
#[derive(Clone)]
pub struct SessionConfig {
    pub store: Arc<dyn SessionStore>,
    pub cookie_name: String,
}

impl SessionConfig {
    /// Uses `store` with the default cookie name.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
        }
    }

    /// An in-memory store with the default cookie name.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// The session of `r`, void when the request carries no session id.
    pub fn session(&self, r: &HttpRequest) -> Session {
        match r.cookie(&self.cookie_name).filter(|id| !id.is_empty()) {
            Some(id) => Session::attached(self.store.clone(), id),
            None => Session::void(),
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("cookie_name", &self.cookie_name)
            .finish_non_exhaustive()
    }
}

/// Handle to one client's session values.
///
/// A void session reads nothing and ignores writes.
#[derive(Clone, Default)]
pub struct Session {
    inner: Option<(Arc<dyn SessionStore>, String)>,
}

impl Session {
    /// A session that stores nothing.
    pub fn void() -> Self {
        Self::default()
    }

    /// A session backed by `store` under `id`.
    pub fn attached(store: Arc<dyn SessionStore>, id: impl Into<String>) -> Self {
        Self {
            inner: Some((store, id.into())),
        }
    }

    /// The session id, if attached.
    pub fn id(&self) -> Option<&str> {
        self.inner.as_ref().map(|(_, id)| id.as_str())
    }

    pub fn is_void(&self) -> bool {
        self.inner.is_none()
    }

    /// The stored value, `None` when nothing is stored.
    pub fn get(&self, name: &str) -> Option<Value> {
        let (store, id) = self.inner.as_ref()?;
        store.get(id, name)
    }

    /// The stored value as text: strings as is, other values as JSON.
    pub fn get_text(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::Null => None,
            Value::String(text) => Some(text),
            other => Some(other.to_string()),
        }
    }

    /// Stores a string.
    pub fn set(&self, name: &str, value: &str) {
        self.set_value(name, Value::String(value.to_string()));
    }

    /// Stores any JSON value.
    pub fn set_value(&self, name: &str, value: Value) {
        if let Some((store, id)) = &self.inner {
            store.set(id, name, value);
        }
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        let (store, id) = self.inner.as_ref()?;
        store.remove(id, name)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("id", &self.id()).finish()
    }
}

/// Makes a [`Session`] per request.
#[derive(Debug, Clone, Default)]
pub struct SessionProvider {
    config: Option<SessionConfig>,
}

impl SessionProvider {
    /// A provider over `config`; `None` makes void sessions.
    pub fn new(config: Option<SessionConfig>) -> Self {
        Self { config }
    }

    /// A provider making void sessions.
    pub fn void() -> Self {
        Self::default()
    }

    /// Returns the session of `r`, issuing a new session id cookie on `w`
    /// when the request has none.
    pub fn make(&self, w: &mut HttpResponse, r: &HttpRequest) -> Session {
        let Some(config) = &self.config else {
            return Session::void();
        };
        let session = config.session(r);
        if !session.is_void() {
            return session;
        }

        let id = Uuid::new_v4().to_string();
        debug!(session_id = %id, "Issuing session id");
        let cookie = Cookie::new(config.cookie_name.clone(), id.clone())
            .with_path("/")
            .http_only();
        w.add_set_cookie(&cookie.to_string());
        Session::attached(config.store.clone(), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::SET_COOKIE;
    use serde_json::json;

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        store.set("s1", "user", json!("ana"));
        assert_eq!(store.get("s1", "user"), Some(json!("ana")));
        assert_eq!(store.get("s2", "user"), None);

        assert_eq!(store.remove("s1", "user"), Some(json!("ana")));
        assert!(store.is_empty());
    }

    #[test]
    fn test_memory_store_expiry() {
        let store = MemorySessionStore::with_ttl(Duration::ZERO);
        store.set("s1", "user", json!("ana"));
        assert_eq!(store.get("s1", "user"), None);
        assert_eq!(store.remove("s1", "user"), None);
        assert!(store.is_empty());

        // Creating a session drops the expired ones.
        store.set("s1", "user", json!("ana"));
        store.set("s2", "user", json!("bob"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.purge_expired(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_memory_store_purge_keeps_live_sessions() {
        let store = MemorySessionStore::with_ttl(Duration::from_secs(60));
        store.set("s1", "user", json!("ana"));

        assert_eq!(store.purge_expired(), 0);
        assert_eq!(store.get("s1", "user"), Some(json!("ana")));
        assert_eq!(store.purge_at(Instant::now() + Duration::from_secs(61)), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_void_session() {
        let session = Session::void();
        session.set("user", "ana");
        assert_eq!(session.get("user"), None);
        assert!(session.is_void());
    }

    #[test]
    fn test_absent_differs_from_empty() {
        let session = Session::attached(Arc::new(MemorySessionStore::new()), "s1");
        session.set("empty", "");
        assert_eq!(session.get("empty"), Some(json!("")));
        assert_eq!(session.get("missing"), None);

        session.set_value("count", json!(3));
        assert_eq!(session.get_text("count").as_deref(), Some("3"));
    }

    #[test]
    fn test_make_issues_session_cookie() {
        let config = SessionConfig::in_memory();
        let provider = SessionProvider::new(Some(config.clone()));

        let mut w = HttpResponse::new();
        let session = provider.make(&mut w, &HttpRequest::builder().build());
        let id = session.id().unwrap().to_string();
        session.set("user", "ana");

        let header = w.headers()[SET_COOKIE].to_str().unwrap().to_string();
        assert!(header.starts_with(&format!("{DEFAULT_SESSION_COOKIE}={id}")));

        let r = HttpRequest::builder().cookie(DEFAULT_SESSION_COOKIE, &id).build();
        let mut w = HttpResponse::new();
        let again = provider.make(&mut w, &r);
        assert_eq!(again.get_text("user").as_deref(), Some("ana"));
        assert!(w.headers().get(SET_COOKIE).is_none());
    }

    #[test]
    fn test_void_provider() {
        let mut w = HttpResponse::new();
        let session = SessionProvider::void().make(&mut w, &HttpRequest::builder().build());
        assert!(session.is_void());
        assert!(w.headers().is_empty());
    }
}
