//! Per-route request counters and latency.

use std::time::Instant;

use futures_util::future::{BoxFuture, FutureExt};

use crate::exception::Failure;
use crate::filter::{Filter, Next};
use crate::http::{HttpRequest, HttpResponse, RequestExt};
use crate::observability::metrics;

/// Records `router_requests_total` and `router_request_duration_seconds`
/// labelled by matched route name and status.
///
/// As a global filter it sees responses already produced by the exception
/// mappers. Failures that still reach it are recorded with status 500.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsFilter;

impl Filter<HttpRequest, HttpResponse> for StatsFilter {
    fn apply(
        &self,
        request: HttpRequest,
        next: Next<HttpRequest, HttpResponse>,
    ) -> BoxFuture<'static, Result<HttpResponse, Failure>> {
        let route = request
            .matched_route()
            .map(|r| r.name.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let method = request.method().to_string();
        let start = Instant::now();

        async move {
            let result = next.run(request).await;
            let status = match &result {
                Ok(response) => response.status().as_u16(),
                Err(_) => 500,
            };
            metrics::record_request(&route, &method, status, start);
            result
        }
        .boxed()
    }
}
