//! Inbound request model.

use std::io::{self, Cursor, Read};

use bytes::Bytes;
use http::header::{CONTENT_TYPE, COOKIE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use url::form_urlencoded;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// The unread request body.
///
/// Handed to the backend as is; binding never reads from it.
#[derive(Debug, Default)]
pub struct RequestBody {
    inner: Cursor<Bytes>,
}

impl RequestBody {
    /// Wraps raw body bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            inner: Cursor::new(bytes.into()),
        }
    }

    /// An empty body.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Bytes not read yet.
    pub fn remaining(&self) -> &[u8] {
        let bytes = self.inner.get_ref();
        let pos = (self.inner.position() as usize).min(bytes.len());
        &bytes[pos..]
    }

    /// Consumes the body, returning the bytes not read yet.
    pub fn into_bytes(self) -> Bytes {
        let pos = self.inner.position() as usize;
        let bytes = self.inner.into_inner();
        bytes.slice(pos.min(bytes.len())..)
    }
}

impl Read for RequestBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl From<RequestBody> for Bytes {
    fn from(body: RequestBody) -> Self {
        body.into_bytes()
    }
}

impl From<RequestBody> for Vec<u8> {
    fn from(body: RequestBody) -> Self {
        body.into_bytes().to_vec()
    }
}

impl From<RequestBody> for String {
    /// Invalid UTF-8 is replaced.
    fn from(body: RequestBody) -> Self {
        String::from_utf8_lossy(&body.into_bytes()).into_owned()
    }
}

/// An inbound request, as seen by adapter handlers.
#[derive(Debug)]
pub struct HttpRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    form: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    path_vars: Vec<(String, String)>,
    body: Option<RequestBody>,
}

impl HttpRequest {
    /// Builds a request, parsing the query, cookies and an url-encoded form.
    ///
    /// The form is parsed from a copy of the body, which stays unread.
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        let query = uri.query().map(parse_pairs).unwrap_or_default();
        let cookies = parse_cookies(&headers);
        let form = if carries_form(&method, &headers) {
            parse_pairs(&String::from_utf8_lossy(&body))
        } else {
            Vec::new()
        };

        Self {
            method,
            uri,
            headers,
            query,
            form,
            cookies,
            path_vars: Vec::new(),
            body: Some(RequestBody::new(body)),
        }
    }

    /// Starts a request builder, mostly for tests.
    pub fn builder() -> HttpRequestBuilder {
        HttpRequestBuilder::default()
    }

    /// Sets the route variables matched by the router.
    pub fn with_path_vars<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.path_vars = vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First query value for `name`.
    pub fn query(&self, name: &str) -> Option<&str> {
        lookup(&self.query, name)
    }

    /// First form value for `name`.
    pub fn form(&self, name: &str) -> Option<&str> {
        lookup(&self.form, name)
    }

    /// Value of the cookie `name`.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        lookup(&self.cookies, name)
    }

    /// Route variable `name`.
    pub fn path_var(&self, name: &str) -> Option<&str> {
        lookup(&self.path_vars, name)
    }

    /// All request cookies, in header order.
    pub fn cookies(&self) -> &[(String, String)] {
        &self.cookies
    }

    /// Takes the body; later calls return an empty body.
    pub fn take_body(&mut self) -> RequestBody {
        self.body.take().unwrap_or_default()
    }
}

impl From<http::Request<Bytes>> for HttpRequest {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        HttpRequest::new(parts.method, parts.uri, parts.headers, body)
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn parse_pairs(input: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(input.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn carries_form(method: &Method, headers: &HeaderMap) -> bool {
    let has_body = matches!(*method, Method::POST | Method::PUT | Method::PATCH);
    let is_form = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with(FORM_CONTENT_TYPE));
    has_body && is_form
}

fn parse_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let value = value.trim().trim_matches('"');
            Some((name.trim().to_string(), value.to_string()))
        })
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

/// Builder for [`HttpRequest`].
#[derive(Debug, Default)]
pub struct HttpRequestBuilder {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_vars: Vec<(String, String)>,
}

impl HttpRequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the URI; an unparsable URI is ignored.
    pub fn uri(mut self, uri: &str) -> Self {
        if let Ok(uri) = uri.parse() {
            self.uri = uri;
        }
        self
    }

    /// Appends a header; invalid names or values are ignored.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Adds a request cookie.
    pub fn cookie(self, name: &str, value: &str) -> Self {
        self.header(COOKIE.as_str(), &format!("{name}={value}"))
    }

    /// Sets an url-encoded form body and switches the method to POST.
    pub fn form<'a>(self, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        self.method(Method::POST)
            .header(CONTENT_TYPE.as_str(), FORM_CONTENT_TYPE)
            .body(encoded)
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn path_var(mut self, name: &str, value: &str) -> Self {
        self.path_vars.push((name.to_string(), value.to_string()));
        self
    }

    pub fn build(self) -> HttpRequest {
        HttpRequest::new(self.method, self.uri, self.headers, self.body).with_path_vars(self.path_vars)
    }
}
