//! Router error types.
//!
//! # Design Decisions
//! - Build-time errors (`RouterError`) are fatal at startup, never retried
//! - Dispatch-time errors (`DispatchError`) are recovered at the transport
//!   boundary into protocol-level "not found" / "internal error" responses
//! - Handler failures travel as `Failure` and are normally absorbed by the
//!   exception mappers before they reach the caller

use crate::exception::Failure;

/// Configuration and ordering errors raised while a router is being built.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// A mutator was called after the router was frozen.
    #[error("router is frozen; no further registration is permitted")]
    Frozen,

    /// A second controller was added to a Thrift router.
    #[error("a controller is already registered (existing: {existing}, rejected: {rejected})")]
    MultipleControllers { existing: String, rejected: String },

    /// A filter was added to a Thrift router after its controller.
    #[error("filters must be added before the controller ({controller})")]
    FilterAfterController { controller: String },

    /// The same method and template were registered twice on one interface.
    #[error("route {method} {path} is already registered")]
    DuplicateRoute { method: String, path: String },

    /// Two Thrift methods share an identifier.
    #[error("method {method} is already registered")]
    DuplicateMethod { method: String },

    /// A URI template could not be compiled.
    #[error("invalid route template {template:?}: {reason}")]
    InvalidTemplate { template: String, reason: &'static str },

    /// No default exception mapper was registered before freezing.
    #[error("no default exception mapper registered")]
    MissingDefaultMapper,
}

/// Errors returned from dispatching a single request.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No HTTP route matched the method and path.
    #[error("no route for {method} {path}")]
    RouteNotFound { method: String, path: String },

    /// No Thrift method is registered under the identifier.
    #[error("no method named {method}")]
    MethodNotFound { method: String },

    /// A failure escaped the chain (only possible when filters are bypassed).
    #[error("unhandled failure: {0}")]
    Unhandled(#[source] Failure),
}

impl DispatchError {
    /// True for the not-found family the transport turns into a 404-equivalent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DispatchError::RouteNotFound { .. } | DispatchError::MethodNotFound { .. }
        )
    }
}
