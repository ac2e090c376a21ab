//! Thrift service implementations.

use std::sync::Arc;

use crate::filter::{Filter, FilterChain, Handler, SharedHandler};
use crate::thrift::{ThriftRequest, ThriftResponse};

/// One method of a Thrift service: identifier, per-method filters, callback.
pub struct ThriftMethod {
    name: String,
    filters: FilterChain<ThriftRequest, ThriftResponse>,
    callback: SharedHandler<ThriftRequest, ThriftResponse>,
}

impl ThriftMethod {
    pub fn new<H>(name: impl Into<String>, callback: H) -> Self
    where
        H: Handler<ThriftRequest, ThriftResponse>,
    {
        Self {
            name: name.into(),
            filters: FilterChain::identity(),
            callback: Arc::new(callback),
        }
    }

    /// Add a filter that wraps only this method.
    pub fn filter<F: Filter<ThriftRequest, ThriftResponse>>(mut self, filter: F) -> Self {
        self.filters = self.filters.with(filter);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        String,
        FilterChain<ThriftRequest, ThriftResponse>,
        SharedHandler<ThriftRequest, ThriftResponse>,
    ) {
        (self.name, self.filters, self.callback)
    }
}

impl std::fmt::Debug for ThriftMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThriftMethod")
            .field("name", &self.name)
            .field("filters", &self.filters)
            .finish()
    }
}

/// The single service a Thrift router serves.
///
/// ```
/// use std::sync::Arc;
/// use request_router::exception::Failure;
/// use request_router::thrift::{ThriftController, ThriftMethod, ThriftRequest, ThriftResponse};
///
/// struct Echo;
///
/// impl ThriftController for Echo {
///     fn service_name(&self) -> &str {
///         "Echo"
///     }
///
///     fn methods(self: Arc<Self>) -> Vec<ThriftMethod> {
///         vec![ThriftMethod::new("echo", |req: ThriftRequest| async move {
///             Ok::<_, Failure>(ThriftResponse::reply(req.payload))
///         })]
///     }
/// }
/// ```
pub trait ThriftController: Send + Sync + 'static {
    fn service_name(&self) -> &str;

    fn methods(self: Arc<Self>) -> Vec<ThriftMethod>;
}
