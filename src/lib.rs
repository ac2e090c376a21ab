//! Request routing and filter-chain composition for HTTP and Thrift services.
//!
//! # Architecture Overview
//!
//! ```text
//!   bootstrap code
//!     │  filter() / exception_mapper() / add() / add_controller()
//!     ▼
//!   ┌────────────────────┐  freeze()  ┌──────────────────────────────────────┐
//!   │ HttpRouterBuilder   │──────────▶│ HttpRouter (immutable, Arc-shared)   │
//!   │ ThriftRouterBuilder │           │ ThriftRouter                          │
//!   └────────────────────┘            └──────────────┬───────────────────────┘
//!                                                    │ dispatch(request)
//!                                                    ▼
//!   matcher / method lookup ──▶ exception mapping ──▶ global filters
//!        ──▶ per-route filters ──▶ callback
//!
//!   Cross-cutting: dark_traffic (mirroring filter), observability, config,
//!   http (tower Service + axum serving), lifecycle (shutdown)
//! ```
//!
//! # Example
//!
//! ```
//! use request_router::exception::Failure;
//! use request_router::http::{response, HttpRequest, RequestExt};
//! use request_router::routing::{HttpRouter, Route};
//! use axum::http::StatusCode;
//!
//! # fn main() -> Result<(), request_router::RouterError> {
//! let mut builder = HttpRouter::builder();
//! builder.add(Route::get("/groups/:id", |req: HttpRequest| async move {
//!     let id = req.param("id").unwrap_or_default().to_string();
//!     Ok::<_, Failure>(response::text(StatusCode::OK, id))
//! })?)?;
//! let router = builder.freeze()?;
//! assert_eq!(router.routes().len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dark_traffic;
pub mod error;
pub mod exception;
pub mod filter;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod thrift;

pub use config::RouterConfig;
pub use error::{DispatchError, RouterError};
pub use exception::{Exception, Failure, HttpException};
pub use filter::{Filter, FilterChain, Handler, Next};
pub use http::{HttpServer, RouterService};
pub use lifecycle::Shutdown;
pub use routing::{HttpRouter, HttpRouterBuilder, Route};
pub use thrift::{ThriftRouter, ThriftRouterBuilder};
