//! # httper Framework
//!
//! Serving-time runtime for adapters generated by httper.
//!
//! A generated handler receives an [`HttpRequest`] and an [`HttpResponse`],
//! resolves its arguments through a [`ProviderChain`], calls the backend
//! method and hands the outcome to a [`Finalizer`].
//!
//! This layer provides:
//! - The request/response model, convertible from and into `http` types
//! - The seven facets and the per-request [`ProviderChain`]
//! - Cookie and session accessors with their per-request factories
//! - Default finalizers and the [`coerce`] helper used for integer arguments
//!
//! ## Example
//!
//! ```rust
//! use httper_framework::{DataProvider, FacetKind, HttpRequest, Mode};
//!
//! let r = HttpRequest::builder()
//!     .uri("/tomatoes?color=red")
//!     .path_var("id", "7")
//!     .build();
//!
//! let chain = DataProvider::new(Mode::Extended).make(&r);
//! assert_eq!(chain.get_text(FacetKind::Url, "id").as_deref(), Some("7"));
//! assert_eq!(chain.get_text(FacetKind::Get, "color").as_deref(), Some("red"));
//! ```

pub mod bind;
pub mod chain;
pub mod cookie;
pub mod error;
pub mod facet;
pub mod finalizer;
pub mod request;
pub mod response;
pub mod session;

pub use bind::{Handler, coerce};
pub use chain::{DataProvider, ProviderChain};
pub use cookie::{Cookie, CookieJar, CookieProvider};
pub use error::{BindError, BindResult};
pub use facet::{Facet, FacetKind, FacetValue, Mode};
pub use finalizer::{DefaultFinalizer, Finalizer, HttpFinalizer};
pub use request::{HttpRequest, HttpRequestBuilder, RequestBody};
pub use response::HttpResponse;
pub use session::{MemorySessionStore, Session, SessionConfig, SessionProvider, SessionStore};

#[doc(hidden)]
pub use tracing;
