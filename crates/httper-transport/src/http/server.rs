//! HTTP listener with a shutdown handle.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::error::{TransportError, TransportResult};

/// Handle to a running listener.
///
/// Dropping the handle stops the listener.
#[derive(Debug)]
pub struct ListenerHandle {
    /// Unique identifier for this listener.
    pub id: String,
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ListenerHandle {
    fn new(id: impl Into<String>, local_addr: SocketAddr, shutdown_tx: oneshot::Sender<()>) -> Self {
        Self {
            id: id.into(),
            local_addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// The bound address; useful when listening on port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops the listener.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Serves a [`Router`] on a TCP address.
pub struct HttpServer;

impl HttpServer {
    /// Binds `addr` and serves `router` on a spawned task until the returned
    /// handle is stopped or dropped.
    pub async fn listen(addr: &str, router: Router) -> TransportResult<ListenerHandle> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        info!(addr = %local_addr, "HTTP server listening");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!(error = %e, "HTTP server error");
            }
            info!(addr = %local_addr, "HTTP server stopped");
        });

        Ok(ListenerHandle::new(
            format!("http-server-{local_addr}"),
            local_addr,
            shutdown_tx,
        ))
    }
}
