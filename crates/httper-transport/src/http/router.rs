//! Mounting adapter handlers on an axum [`Router`].

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{RawPathParams, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodFilter, MethodRouter, on};
use httper_framework::{Handler, HttpRequest, HttpResponse};
use tracing::{debug, warn};

/// Largest request body collected before a handler runs.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Wraps one adapter handler as an axum method router.
pub fn endpoint<A>(adapter: Arc<A>, filter: MethodFilter, handler: Handler<A>) -> MethodRouter
where
    A: Send + Sync + 'static,
{
    endpoint_with_limit(adapter, filter, handler, DEFAULT_BODY_LIMIT)
}

fn endpoint_with_limit<A>(
    adapter: Arc<A>,
    filter: MethodFilter,
    handler: Handler<A>,
    body_limit: usize,
) -> MethodRouter
where
    A: Send + Sync + 'static,
{
    on(
        filter,
        move |params: Result<RawPathParams, RawPathParamsRejection>, req: Request| {
            let adapter = adapter.clone();
            async move { dispatch(adapter.as_ref(), handler, params, req, body_limit).await }
        },
    )
}

async fn dispatch<A>(
    adapter: &A,
    handler: Handler<A>,
    params: Result<RawPathParams, RawPathParamsRejection>,
    req: Request,
    body_limit: usize,
) -> Response {
    let (parts, body) = req.into_parts();
    let bytes = match to_bytes(body, body_limit).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(uri = %parts.uri, error = %err, "Failed to read request body");
            return (StatusCode::BAD_REQUEST, "failed to read request body").into_response();
        }
    };

    let vars: Vec<(String, String)> = params
        .map(|params| {
            params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default();

    let mut r = HttpRequest::new(parts.method, parts.uri, parts.headers, bytes).with_path_vars(vars);
    let mut w = HttpResponse::new();
    handler(adapter, &mut w, &mut r);

    debug!(method = %r.method(), uri = %r.uri(), status = %w.status(), "Handled request");
    w.into_http().map(Body::from).into_response()
}

/// Builds a [`Router`] from the handlers of one adapter.
pub struct AdapterRouter<A> {
    adapter: Arc<A>,
    router: Router,
    body_limit: usize,
}

impl<A> AdapterRouter<A>
where
    A: Send + Sync + 'static,
{
    pub fn new(adapter: Arc<A>) -> Self {
        Self {
            adapter,
            router: Router::new(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Sets the body limit for routes added afterwards.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Mounts `handler` on `path` for the methods in `filter`.
    ///
    /// Route variables (`/tomatoes/{id}`) feed the `url` and `route` facets.
    pub fn route(mut self, path: &str, filter: MethodFilter, handler: Handler<A>) -> Self {
        let endpoint = endpoint_with_limit(self.adapter.clone(), filter, handler, self.body_limit);
        self.router = self.router.route(path, endpoint);
        self
    }

    pub fn get(self, path: &str, handler: Handler<A>) -> Self {
        self.route(path, MethodFilter::GET, handler)
    }

    pub fn post(self, path: &str, handler: Handler<A>) -> Self {
        self.route(path, MethodFilter::POST, handler)
    }

    pub fn put(self, path: &str, handler: Handler<A>) -> Self {
        self.route(path, MethodFilter::PUT, handler)
    }

    pub fn patch(self, path: &str, handler: Handler<A>) -> Self {
        self.route(path, MethodFilter::PATCH, handler)
    }

    pub fn delete(self, path: &str, handler: Handler<A>) -> Self {
        self.route(path, MethodFilter::DELETE, handler)
    }

    /// The wrapped adapter.
    pub fn adapter(&self) -> &Arc<A> {
        &self.adapter
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}
