//! HTTP server bridge.
//!
//! Adapter handlers are synchronous; each request is collected, converted to
//! an [`HttpRequest`](httper_framework::HttpRequest), handled, and converted
//! back into an axum response.

mod router;
mod server;

pub use router::{AdapterRouter, DEFAULT_BODY_LIMIT, endpoint};
pub use server::{HttpServer, ListenerHandle};
