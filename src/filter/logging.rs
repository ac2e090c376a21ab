//! Access logging.

use std::time::Instant;

use futures_util::future::{BoxFuture, FutureExt};

use crate::exception::Failure;
use crate::filter::{Filter, Next};
use crate::http::{HttpRequest, HttpResponse, RequestExt};
use crate::thrift::{ThriftRequest, ThriftResponse};

/// Emits one structured log line per request once its response is ready.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingFilter;

impl Filter<HttpRequest, HttpResponse> for LoggingFilter {
    fn apply(
        &self,
        request: HttpRequest,
        next: Next<HttpRequest, HttpResponse>,
    ) -> BoxFuture<'static, Result<HttpResponse, Failure>> {
        let method = request.method().clone();
        let path = request.uri().path().to_owned();
        let request_id = request.request_id().unwrap_or("unknown").to_owned();
        let start = Instant::now();

        async move {
            let result = next.run(request).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(response) => tracing::info!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    status = response.status().as_u16(),
                    elapsed_ms,
                    "Request completed"
                ),
                Err(failure) => tracing::warn!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    error = %failure,
                    elapsed_ms,
                    "Request failed"
                ),
            }
            result
        }
        .boxed()
    }
}

impl Filter<ThriftRequest, ThriftResponse> for LoggingFilter {
    fn apply(
        &self,
        request: ThriftRequest,
        next: Next<ThriftRequest, ThriftResponse>,
    ) -> BoxFuture<'static, Result<ThriftResponse, Failure>> {
        let method = request.method.clone();
        let start = Instant::now();

        async move {
            let result = next.run(request).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(response) => tracing::info!(
                    method = %method,
                    exception = response.is_exception(),
                    elapsed_ms,
                    "Thrift call completed"
                ),
                Err(failure) => tracing::warn!(
                    method = %method,
                    error = %failure,
                    elapsed_ms,
                    "Thrift call failed"
                ),
            }
            result
        }
        .boxed()
    }
}
