//! Converts failures escaping the chain into responses.

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

use crate::exception::{ExceptionResolver, Failure};
use crate::filter::{Filter, Next};

/// Outermost filter of every frozen router, repeated just inside the global
/// filters so those see mapped responses.
///
/// Anything a filter or callback raises is handed to the resolver, so a
/// request that went through the chain always ends with a response.
pub struct ExceptionMappingFilter<Rep> {
    resolver: Arc<ExceptionResolver<Rep>>,
}

impl<Rep> ExceptionMappingFilter<Rep> {
    pub fn new(resolver: Arc<ExceptionResolver<Rep>>) -> Self {
        Self { resolver }
    }
}

impl<Req, Rep> Filter<Req, Rep> for ExceptionMappingFilter<Rep>
where
    Req: Send + 'static,
    Rep: Send + 'static,
{
    fn apply(&self, request: Req, next: Next<Req, Rep>) -> BoxFuture<'static, Result<Rep, Failure>> {
        let resolver = self.resolver.clone();
        async move {
            match next.run(request).await {
                Ok(response) => Ok(response),
                Err(failure) => {
                    tracing::debug!(
                        error = %failure,
                        exception = ?failure.exception_type(),
                        "Mapping failure to response"
                    );
                    Ok(resolver.resolve(&failure))
                }
            }
        }
        .boxed()
    }
}
