//! # httper Transport
//!
//! Serves httper adapters over HTTP.
//!
//! ## Features
//!
//! - `http-server`: axum bridge ([`AdapterRouter`]) and a listener with a
//!   shutdown handle ([`HttpServer`])
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  Backend type       │  (hand-written methods)
//! ├─────────────────────┤
//! │  Generated adapter  │  (httper-framework handlers)
//! ├─────────────────────┤
//! │  httper-transport   │  <- This crate (axum bridge)
//! ├─────────────────────┤
//! │  Network (TCP/HTTP) │
//! └─────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use httper_transport::{AdapterRouter, HttpServer};
//!
//! let adapter = Arc::new(ControllerHttp::new(Controller::default(), None));
//! let router = AdapterRouter::new(adapter)
//!     .get("/tomatoes/{id}", ControllerHttp::get_by_id)
//!     .post("/tomatoes", ControllerHttp::create)
//!     .into_router();
//!
//! let handle = HttpServer::listen("127.0.0.1:8080", router).await?;
//! tokio::signal::ctrl_c().await?;
//! handle.stop();
//! ```

pub mod error;

#[cfg(feature = "http-server")]
pub mod http;

pub use error::{TransportError, TransportResult};

#[cfg(feature = "http-server")]
pub use http::{AdapterRouter, HttpServer, ListenerHandle, endpoint};
