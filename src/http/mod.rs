//! HTTP transport boundary.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum::serve, TraceLayer)
//!     → RouterService (buffer body, pick interface)
//!     → routing::HttpRouter::dispatch_with
//!     → response.rs (RouteNotFound → 404, escaped failure → 500)
//!     → Send to client
//! ```
//!
//! The core works on fully buffered requests and responses; streaming bodies
//! only exist on the transport side of `RouterService`.

pub mod request;
pub mod response;
pub mod server;

use axum::body::Bytes;

pub use request::{RequestExt, X_REQUEST_ID};
pub use server::{HttpServer, RouterService};

/// Decoded request handed to routes and filters.
pub type HttpRequest = axum::http::Request<Bytes>;

/// Response produced by routes, filters and exception mappers.
pub type HttpResponse = axum::http::Response<Bytes>;
