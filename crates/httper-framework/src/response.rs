//! Outbound response model.

use std::io::{self, Write};

use bytes::Bytes;
use http::header::{CONTENT_TYPE, SET_COOKIE};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use tracing::warn;

/// The response a handler writes into.
///
/// The status is set once: either by [`write_header`](Self::write_header) or
/// implicitly to `200 OK` by the first body write.
#[derive(Debug, Default)]
pub struct HttpResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl HttpResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status. Later calls are ignored with a warning.
    pub fn write_header(&mut self, status: StatusCode) {
        match self.status {
            Some(current) => {
                warn!(%current, ignored = %status, "Response status already written");
            }
            None => self.status = Some(status),
        }
    }

    /// The written status; `200 OK` until one is written.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Whether a status has been written.
    pub fn is_committed(&self) -> bool {
        self.status.is_some()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Replaces a header; invalid values are dropped with a warning.
    pub fn set_header(&mut self, name: HeaderName, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(err) => warn!(header = %name, error = %err, "Dropping invalid header value"),
        }
    }

    /// Appends a `Set-Cookie` header.
    pub fn add_set_cookie(&mut self, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.append(SET_COOKIE, value);
            }
            Err(err) => warn!(error = %err, "Dropping invalid Set-Cookie value"),
        }
    }

    /// Body bytes written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, for tests and logging.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Converts into an `http` response, defaulting the content type to
    /// plain text when a body was written without one.
    pub fn into_http(self) -> http::Response<Bytes> {
        let status = self.status();
        let mut headers = self.headers;
        if !self.body.is_empty() && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        }

        let mut res = http::Response::new(Bytes::from(self.body));
        *res.status_mut() = status;
        *res.headers_mut() = headers;
        res
    }
}

impl Write for HttpResponse {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
