//! Finalizers turn a backend outcome into a response.

use std::fmt::Display;
use std::io::{self, Read, Write};

use http::StatusCode;
use http::header::{CONTENT_TYPE, HeaderName};
use tracing::debug;

use crate::request::HttpRequest;
use crate::response::HttpResponse;

/// Converts a handler outcome into a response.
///
/// Generated adapters implement this trait, delegating each method either to
/// the backend or to [`HttpFinalizer`], as decided at generation time.
pub trait Finalizer {
    /// Writes the failure response for `err`.
    fn handle_error(&self, err: &dyn Display, w: &mut HttpResponse, r: &HttpRequest);

    /// Writes the success response from `body`.
    fn handle_success(&self, w: &mut HttpResponse, body: &mut dyn Read) -> io::Result<()>;
}

/// Error: `500` with the error text. Success: `200` without a body.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFinalizer;

impl Finalizer for DefaultFinalizer {
    fn handle_error(&self, err: &dyn Display, w: &mut HttpResponse, r: &HttpRequest) {
        debug!(method = %r.method(), uri = %r.uri(), error = %err, "Request failed");
        w.set_header(CONTENT_TYPE, "text/plain; charset=utf-8");
        w.set_header(HeaderName::from_static("x-content-type-options"), "nosniff");
        w.write_header(StatusCode::INTERNAL_SERVER_ERROR);
        // Writing into the in-memory body cannot fail.
        let _ = writeln!(w, "{err}");
    }

    fn handle_success(&self, w: &mut HttpResponse, _body: &mut dyn Read) -> io::Result<()> {
        w.write_header(StatusCode::OK);
        Ok(())
    }
}

/// [`DefaultFinalizer`] that also copies the success body verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFinalizer;

impl Finalizer for HttpFinalizer {
    fn handle_error(&self, err: &dyn Display, w: &mut HttpResponse, r: &HttpRequest) {
        DefaultFinalizer.handle_error(err, w, r);
    }

    fn handle_success(&self, w: &mut HttpResponse, body: &mut dyn Read) -> io::Result<()> {
        DefaultFinalizer.handle_success(w, body)?;
        io::copy(body, w)?;
        Ok(())
    }
}
