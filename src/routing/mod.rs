//! HTTP routing subsystem.
//!
//! # Data Flow
//! ```text
//! Build phase (startup):
//!     filter() / exception_mapper() / add() / add_controller()
//!     → registry.rs (routes + global filters in effect at registration)
//!     → router.rs freeze()
//!     → compose: exception mapping → global → exception mapping → per-route → callback
//!     → immutable RouteTable shared by Arc
//!
//! Incoming Request (method, path)
//!     → registry.rs (linear scan, registration order)
//!     → matcher.rs (template match, parameter binding)
//!     → precomposed handler, or RouteNotFound
//! ```
//!
//! # Design Decisions
//! - Routes compiled once at freeze, immutable at runtime
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod matcher;
pub mod registry;
pub mod route;
pub mod router;

pub use matcher::{PathParams, PathPattern, WILDCARD};
pub use registry::{CompiledRoute, Interface, RouteRegistry, RouteTable};
pub use route::{MatchedRoute, Route, RouteInfo};
pub use router::{AdminIndexEntry, Controller, DispatchOptions, HttpRouter, HttpRouterBuilder};
