//! Thrift-style method routing.
//!
//! # Data Flow
//! ```text
//! Build phase:
//!     filter()* → exception_mapper()* → add_controller() (exactly once)
//!     → freeze(): exception mapping → global → exception mapping → per-method → callback
//!
//! Decoded ThriftRequest (method name)
//!     → registry.rs (direct key lookup)
//!     → precomposed handler, or MethodNotFound
//! ```
//!
//! Wire framing and protocol encoding live outside this module; requests
//! arrive with the method name already decoded and an opaque payload.

pub mod controller;
pub mod registry;
pub mod request;
pub mod router;

pub use controller::{ThriftController, ThriftMethod};
pub use registry::{MethodRegistry, MethodTable};
pub use request::{ThriftRequest, ThriftResponse};
pub use router::{ThriftRouter, ThriftRouterBuilder};
