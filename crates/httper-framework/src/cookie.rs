//! Cookie accessor.
//!
//! A [`CookieJar`] is made per request from the request cookies. Cookies set
//! through it are buffered and written as `Set-Cookie` headers when the
//! handler flushes the jar, after the backend method returns.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, UtcOffset};
use tracing::warn;

use crate::request::HttpRequest;
use crate::response::HttpResponse;

/// Expiry applied by [`CookieJar::set`] when none is given.
pub const DEFAULT_COOKIE_LIFETIME: Duration = Duration::days(365);

/// A cookie to send back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub expires: Option<OffsetDateTime>,
    /// Seconds; zero or less asks the client to delete the cookie.
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
}

impl Cookie {
    /// Creates a session cookie with only a name and a value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            expires: None,
            max_age: None,
            secure: false,
            http_only: false,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_expires(mut self, expires: OffsetDateTime) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }
}

impl fmt::Display for Cookie {
    /// Renders the `Set-Cookie` header value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, sanitize_value(&self.value))?;
        if let Some(path) = &self.path {
            write!(f, "; Path={}", sanitize_path(path))?;
        }
        if let Some(domain) = self.domain.as_deref().filter(|d| is_valid_domain(d)) {
            write!(f, "; Domain={}", domain.trim_start_matches('.'))?;
        }
        if let Some(expires) = self.expires {
            let fixdate = format_description!(
                "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
            );
            let text = expires
                .to_offset(UtcOffset::UTC)
                .format(fixdate)
                .map_err(|_| fmt::Error)?;
            write!(f, "; Expires={text}")?;
        }
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age.max(0))?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        Ok(())
    }
}

/// RFC 7230 `tchar`.
fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

/// Cookie names must be non-empty tokens.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_token_char)
}

fn is_value_char(c: char) -> bool {
    (' '..'\u{7f}').contains(&c) && !matches!(c, '"' | ';' | '\\')
}

/// Drops characters that are not cookie octets. Values holding a space or
/// a comma are quoted.
fn sanitize_value(value: &str) -> String {
    let clean: String = value.chars().filter(|&c| is_value_char(c)).collect();
    if clean.contains([' ', ',']) {
        format!("\"{clean}\"")
    } else {
        clean
    }
}

fn sanitize_path(path: &str) -> String {
    path.chars()
        .filter(|&c| (' '..'\u{7f}').contains(&c) && c != ';')
        .collect()
}

/// Host names only: labels of letters, digits and `-`, an optional leading dot.
fn is_valid_domain(domain: &str) -> bool {
    let domain = domain.strip_prefix('.').unwrap_or(domain);
    !domain.is_empty()
        && domain.len() <= 255
        && domain.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

#[derive(Debug, Default)]
struct JarState {
    request: Vec<(String, String)>,
    pending: Vec<Cookie>,
}

/// Request cookies plus the cookies to set on the response.
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    state: Arc<Mutex<JarState>>,
}

impl CookieJar {
    /// Creates a jar holding the cookies of `r`.
    pub fn from_request(r: &HttpRequest) -> Self {
        Self {
            state: Arc::new(Mutex::new(JarState {
                request: r.cookies().to_vec(),
                pending: Vec::new(),
            })),
        }
    }

    /// Value of the cookie `name`; cookies set on this jar win over request
    /// cookies.
    pub fn get(&self, name: &str) -> Option<String> {
        self.get_cookie(name).map(|c| c.value)
    }

    /// The cookie `name` as a [`Cookie`].
    pub fn get_cookie(&self, name: &str) -> Option<Cookie> {
        let state = self.state.lock();
        if let Some(cookie) = state.pending.iter().rev().find(|c| c.name == name) {
            return Some(cookie.clone());
        }
        state
            .request
            .iter()
            .find(|(k, _)| k == name)
            .map(|(k, v)| Cookie::new(k.clone(), v.clone()))
    }

    /// Sets a cookie expiring at `expires`, or in one year.
    pub fn set(&self, name: &str, value: &str, expires: Option<OffsetDateTime>) -> Cookie {
        let expires = expires.unwrap_or_else(|| OffsetDateTime::now_utc() + DEFAULT_COOKIE_LIFETIME);
        let cookie = Cookie::new(name, value).with_expires(expires);
        self.set_cookie(cookie.clone());
        cookie
    }

    /// Sets a fully specified cookie.
    pub fn set_cookie(&self, cookie: Cookie) {
        if !is_valid_name(&cookie.name) {
            warn!(name = %cookie.name, "Ignoring cookie with an invalid name");
            return;
        }
        self.state.lock().pending.push(cookie);
    }

    /// Number of cookies waiting to be written.
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Writes pending cookies as `Set-Cookie` headers and clears them.
    pub fn write_to(&self, w: &mut HttpResponse) {
        let pending = std::mem::take(&mut self.state.lock().pending);
        for cookie in pending {
            w.add_set_cookie(&cookie.to_string());
        }
    }
}

/// Makes a [`CookieJar`] per request.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieProvider;

impl CookieProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn make(&self, r: &HttpRequest) -> CookieJar {
        CookieJar::from_request(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::SET_COOKIE;
    use time::macros::datetime;

    #[test]
    fn test_render_set_cookie() {
        let cookie = Cookie::new("sid", "abc")
            .with_path("/")
            .with_expires(datetime!(2015-10-21 07:28:00 UTC))
            .with_max_age(60)
            .secure()
            .http_only();

        assert_eq!(
            cookie.to_string(),
            "sid=abc; Path=/; Expires=Wed, 21 Oct 2015 07:28:00 GMT; Max-Age=60; Secure; HttpOnly"
        );
    }

    #[test]
    fn test_get_prefers_pending() {
        let r = HttpRequest::builder().cookie("theme", "light").build();
        let jar = CookieProvider::new().make(&r);

        assert_eq!(jar.get("theme").as_deref(), Some("light"));
        jar.set("theme", "dark", None);
        assert_eq!(jar.get("theme").as_deref(), Some("dark"));
        assert_eq!(jar.get("missing"), None);
    }

    #[test]
    fn test_default_expiry_is_one_year() {
        let jar = CookieJar::default();
        let before = OffsetDateTime::now_utc();
        let cookie = jar.set("a", "1", None);

        let lifetime = cookie.expires.unwrap() - before;
        assert!(lifetime >= DEFAULT_COOKIE_LIFETIME - Duration::seconds(5));
        assert!(lifetime <= DEFAULT_COOKIE_LIFETIME + Duration::seconds(5));
    }

    #[test]
    fn test_clones_share_and_flush_once() {
        let jar = CookieJar::default();
        let clone = jar.clone();
        clone.set_cookie(Cookie::new("a", "1"));
        clone.set_cookie(Cookie::new("", "ignored"));
        assert_eq!(jar.pending(), 1);

        let mut w = HttpResponse::new();
        jar.write_to(&mut w);
        jar.write_to(&mut w);
        assert_eq!(w.headers().get_all(SET_COOKIE).iter().count(), 1);
        assert_eq!(w.headers()[SET_COOKIE], "a=1");
    }

    #[test]
    fn test_value_cannot_inject_attributes() {
        let jar = CookieJar::default();
        jar.set_cookie(Cookie::new("color", "red; Domain=evil.example; Path=/admin"));

        let mut w = HttpResponse::new();
        jar.write_to(&mut w);
        assert_eq!(
            w.headers()[SET_COOKIE],
            "color=\"red Domain=evil.example Path=/admin\""
        );
    }

    #[test]
    fn test_sanitize_value() {
        assert_eq!(Cookie::new("a", "b\"c\\d\ne").to_string(), "a=bcde");
        assert_eq!(Cookie::new("a", "tomate rouge").to_string(), "a=\"tomate rouge\"");
        assert_eq!(Cookie::new("a", "1,2").to_string(), "a=\"1,2\"");
        assert_eq!(Cookie::new("a", "caf\u{e9}").to_string(), "a=caf");
    }

    #[test]
    fn test_invalid_names_and_attributes() {
        assert!(is_valid_name("session_id"));
        assert!(!is_valid_name("a b"));
        assert!(!is_valid_name("a;b"));
        assert!(!is_valid_name("a=b"));

        let jar = CookieJar::default();
        jar.set_cookie(Cookie::new("bad name", "1"));
        jar.set_cookie(Cookie::new("x=y", "1"));
        assert_eq!(jar.pending(), 0);

        let cookie = Cookie::new("a", "1")
            .with_path("/x; Secure")
            .with_domain("evil.example; HttpOnly");
        assert_eq!(cookie.to_string(), "a=1; Path=/x Secure");

        let cookie = Cookie::new("a", "1").with_domain(".example.com");
        assert_eq!(cookie.to_string(), "a=1; Domain=example.com");
    }
}
