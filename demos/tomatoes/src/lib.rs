//! A tomato store exposed over HTTP through a generated adapter.
//!
//! `Controller` only speaks in typed arguments and `Result`s. The `#[adapter]`
//! attribute derives `ControllerHttp`, whose handlers pull `urlID` from the
//! route, `postName` from the form, `sessionUser` from the session and so on.

#![allow(non_snake_case)]

use std::fmt;
use std::io::{self, Cursor, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use http::header::{CONTENT_TYPE, HeaderValue};
use http::StatusCode;
use httper_framework::{CookieJar, HttpRequest, HttpResponse, RequestBody, Session};
use httper_macros::adapter;
use httper_transport::AdapterRouter;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// JSON response body.
pub type Json = Cursor<Vec<u8>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tomato {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TomatoPatch {
    name: String,
}

#[derive(Debug, Error)]
pub enum TomatoError {
    #[error("tomato {0} not found")]
    NotFound(i64),

    #[error("a tomato needs a name")]
    MissingName,

    #[error("invalid tomato: {0}")]
    Json(#[from] serde_json::Error),
}

fn json<T: Serialize>(value: &T) -> Result<Json, TomatoError> {
    Ok(Cursor::new(serde_json::to_vec(value)?))
}

/// In-memory tomato store.
#[derive(Debug, Default)]
pub struct Controller {
    tomatoes: RwLock<Vec<Tomato>>,
    calls: AtomicUsize,
}

impl Controller {
    /// A store holding `names`, with ids from 0.
    pub fn with_tomatoes<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let tomatoes = names
            .into_iter()
            .enumerate()
            .map(|(id, name)| Tomato {
                id: id as i64,
                name: name.to_string(),
            })
            .collect();
        Self {
            tomatoes: RwLock::new(tomatoes),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of handler calls that reached the store.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn called(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    fn find(&self, id: i64) -> Result<Tomato, TomatoError> {
        self.tomatoes
            .read()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(TomatoError::NotFound(id))
    }
}

#[adapter(name = "ControllerHttp", mode = "extended")]
impl Controller {
    /// Returns one tomato.
    pub fn get_by_id(&self, urlID: i64) -> Result<Json, TomatoError> {
        self.called();
        json(&self.find(urlID)?)
    }

    /// Renames a tomato from a JSON body.
    pub fn update_by_id(&self, urlID: i64, req_body: RequestBody) -> Result<Json, TomatoError> {
        self.called();
        let patch: TomatoPatch = serde_json::from_reader(req_body)?;
        let mut tomatoes = self.tomatoes.write();
        let tomato = tomatoes
            .iter_mut()
            .find(|t| t.id == urlID)
            .ok_or(TomatoError::NotFound(urlID))?;
        tomato.name = patch.name;
        json(tomato)
    }

    pub fn delete_by_id(&self, REQid: i64) -> Result<Json, TomatoError> {
        self.called();
        let mut tomatoes = self.tomatoes.write();
        let before = tomatoes.len();
        tomatoes.retain(|t| t.id != REQid);
        if tomatoes.len() == before {
            return Err(TomatoError::NotFound(REQid));
        }
        json(&serde_json::json!({ "deleted": REQid }))
    }

    /// Adds a tomato from a form field.
    pub fn create(&self, postName: String) -> Result<Json, TomatoError> {
        self.called();
        if postName.is_empty() {
            return Err(TomatoError::MissingName);
        }
        let mut tomatoes = self.tomatoes.write();
        let id = tomatoes.iter().map(|t| t.id + 1).max().unwrap_or(0);
        let tomato = Tomato { id, name: postName };
        tomatoes.push(tomato.clone());
        json(&tomato)
    }

    /// Counts visits in the session and remembers the last color in a cookie.
    pub fn visit(&self, getColor: String, c: CookieJar, s: Session) -> Result<Json, TomatoError> {
        self.called();
        let visits = s
            .get_text("visits")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        s.set_value("visits", visits.into());

        let previous = c.get("color");
        if !getColor.is_empty() {
            c.set("color", &getColor, None);
        }
        json(&serde_json::json!({ "visits": visits, "previous_color": previous }))
    }

    /// Stores the posted user name in the session.
    pub fn login(&self, postUser: String, s: Session) -> Result<Json, TomatoError> {
        self.called();
        s.set("user", &postUser);
        json(&serde_json::json!({ "user": postUser }))
    }

    /// Reads the user name back through the session facet.
    pub fn whoami(&self, sessionUser: String) -> Result<Json, TomatoError> {
        self.called();
        let user = if sessionUser.is_empty() { "anonymous" } else { sessionUser.as_str() };
        json(&serde_json::json!({ "user": user }))
    }

    /// Echoes the request line, writing a header on the way.
    pub fn echo(&self, w: &mut HttpResponse, r: &HttpRequest) -> Result<Json, TomatoError> {
        self.called();
        w.headers_mut()
            .insert("x-tomatoes", HeaderValue::from_static("1"));
        json(&serde_json::json!({ "method": r.method().as_str(), "path": r.uri().path() }))
    }

    /// Not a handler: no `Result`.
    pub fn count(&self) -> usize {
        self.tomatoes.read().len()
    }

    pub fn handle_error(&self, err: &dyn fmt::Display, w: &mut HttpResponse, r: &HttpRequest) {
        debug!(uri = %r.uri(), error = %err, "Tomato request failed");
        w.set_header(CONTENT_TYPE, "application/json");
        w.write_header(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::json!({ "error": err.to_string() });
        let _ = serde_json::to_writer(w, &body);
    }

    pub fn handle_success(&self, w: &mut HttpResponse, body: &mut dyn Read) -> io::Result<()> {
        w.set_header(CONTENT_TYPE, "application/json");
        w.write_header(StatusCode::OK);
        io::copy(body, w)?;
        Ok(())
    }
}

// The same store seen through the minimal facet set, with default finalizers.
#[adapter(name = "LegacyHttp", mode = "std")]
impl Controller {
    /// `urlID` names a facet minimal mode does not have, so it stays 0.
    pub fn lookup(&self, urlID: i64, getName: String) -> Result<Json, TomatoError> {
        self.called();
        let tomato = self.find(urlID)?;
        if !getName.is_empty() && getName != tomato.name {
            return Err(TomatoError::NotFound(urlID));
        }
        json(&tomato)
    }
}

/// Routes of the demo service.
pub fn routes(adapter: Arc<ControllerHttp>) -> AdapterRouter<ControllerHttp> {
    AdapterRouter::new(adapter)
        .get("/tomatoes/{id}", ControllerHttp::get_by_id)
        .put("/tomatoes/{id}", ControllerHttp::update_by_id)
        .delete("/tomatoes", ControllerHttp::delete_by_id)
        .post("/tomatoes", ControllerHttp::create)
        .get("/visit", ControllerHttp::visit)
        .post("/login", ControllerHttp::login)
        .get("/whoami", ControllerHttp::whoami)
        .get("/echo", ControllerHttp::echo)
}
