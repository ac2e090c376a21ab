//! The dark-traffic filter and its sampling and outcome accounting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use serde::Serialize;

use crate::config::DarkTrafficConfig;
use crate::dark_traffic::client::{DarkClient, HttpMirrorClient};
use crate::dark_traffic::{DarkTrafficError, Mirror};
use crate::exception::Failure;
use crate::filter::{Filter, FilterChain, Next};
use crate::http::{HttpRequest, HttpResponse};
use crate::observability::metrics;

/// Decides per request whether it is mirrored.
pub type Sampler<Req> = Arc<dyn Fn(&Req) -> bool + Send + Sync>;

/// Mirror every request.
pub fn always<Req: 'static>() -> impl Fn(&Req) -> bool + Send + Sync + 'static {
    |_| true
}

/// Mirror nothing.
pub fn never<Req: 'static>() -> impl Fn(&Req) -> bool + Send + Sync + 'static {
    |_| false
}

/// Mirror a random `rate` fraction of requests; `rate` is clamped to `[0, 1]`.
pub fn ratio_sampler<Req: 'static>(rate: f64) -> impl Fn(&Req) -> bool + Send + Sync + 'static {
    let rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
    move |_| rate > 0.0 && fastrand::f64() < rate
}

/// In-process counters of mirrored calls.
#[derive(Debug, Default)]
pub struct DarkTrafficStats {
    requests: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    timeouts: AtomicU64,
}

/// Point-in-time copy of `DarkTrafficStats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DarkTrafficSnapshot {
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    pub timeouts: u64,
}

impl DarkTrafficSnapshot {
    /// Calls issued but not yet finished.
    pub fn in_flight(&self) -> u64 {
        self.requests
            .saturating_sub(self.successes + self.failures + self.timeouts)
    }
}

impl DarkTrafficStats {
    pub fn snapshot(&self) -> DarkTrafficSnapshot {
        DarkTrafficSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }
}

/// Mirrors sampled requests to a dark destination without touching the
/// primary response.
pub struct DarkTrafficFilter<Req> {
    client: Arc<dyn DarkClient<Req>>,
    sampler: Sampler<Req>,
    forward_after_service: bool,
    timeout: Duration,
    stats: Arc<DarkTrafficStats>,
}

impl<Req: Mirror> DarkTrafficFilter<Req> {
    /// A filter mirroring every request after the primary response, with a
    /// one second bound on each dark call.
    pub fn new<C: DarkClient<Req>>(client: C) -> Self {
        Self {
            client: Arc::new(client),
            sampler: Arc::new(always::<Req>()),
            forward_after_service: true,
            timeout: Duration::from_secs(1),
            stats: Arc::default(),
        }
    }

    pub fn sampler<F>(mut self, sampler: F) -> Self
    where
        F: Fn(&Req) -> bool + Send + Sync + 'static,
    {
        self.sampler = Arc::new(sampler);
        self
    }

    /// `true`: mirror once the primary response is ready.
    /// `false`: mirror concurrently with the primary call.
    pub fn forward_after_service(mut self, forward_after_service: bool) -> Self {
        self.forward_after_service = forward_after_service;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn stats(&self) -> Arc<DarkTrafficStats> {
        self.stats.clone()
    }

    fn dispatch(&self) -> DarkDispatch<Req> {
        DarkDispatch {
            client: self.client.clone(),
            timeout: self.timeout,
            stats: self.stats.clone(),
        }
    }
}

impl<Req, Rep> Filter<Req, Rep> for DarkTrafficFilter<Req>
where
    Req: Mirror,
    Rep: Send + 'static,
{
    fn apply(&self, request: Req, next: Next<Req, Rep>) -> BoxFuture<'static, Result<Rep, Failure>> {
        if !(self.sampler)(&request) {
            return next.run(request);
        }

        let mirrored = request.mirror();
        let dispatch = self.dispatch();

        if self.forward_after_service {
            async move {
                let result = next.run(request).await;
                dispatch.spawn(mirrored);
                result
            }
            .boxed()
        } else {
            dispatch.spawn(mirrored);
            next.run(request)
        }
    }
}

/// One detached dark call.
struct DarkDispatch<Req> {
    client: Arc<dyn DarkClient<Req>>,
    timeout: Duration,
    stats: Arc<DarkTrafficStats>,
}

impl<Req: Send + 'static> DarkDispatch<Req> {
    fn spawn(self, request: Req) {
        self.stats.requests.fetch_add(1, Ordering::Relaxed);
        metrics::record_dark_request();

        tokio::spawn(async move {
            let outcome = match tokio::time::timeout(self.timeout, self.client.send(request)).await {
                Ok(result) => result,
                Err(_) => Err(DarkTrafficError::Timeout),
            };

            match outcome {
                Ok(()) => {
                    self.stats.successes.fetch_add(1, Ordering::Relaxed);
                    metrics::record_dark_success();
                }
                Err(DarkTrafficError::Timeout) => {
                    tracing::debug!(timeout = ?self.timeout, "Dark traffic call timed out");
                    self.stats.timeouts.fetch_add(1, Ordering::Relaxed);
                    metrics::record_dark_timeout();
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Dark traffic call failed");
                    self.stats.failures.fetch_add(1, Ordering::Relaxed);
                    metrics::record_dark_failure();
                }
            }
        });
    }
}

/// Build the HTTP dark-traffic filter described by `config`.
///
/// Returns `None` when no destination is configured.
pub fn from_config(config: &DarkTrafficConfig) -> Result<Option<DarkTrafficFilter<HttpRequest>>, DarkTrafficError> {
    let Some(destination) = config.destination.as_deref() else {
        tracing::info!("Dark traffic disabled: no destination configured");
        return Ok(None);
    };

    let client = HttpMirrorClient::new(destination, &config.client_id, config.mux_enabled)?;
    let filter = DarkTrafficFilter::new(client)
        .sampler(ratio_sampler::<HttpRequest>(config.sample_rate))
        .forward_after_service(config.forward_after_service)
        .timeout(Duration::from_millis(config.timeout_ms));

    tracing::info!(
        destination = %destination,
        sample_rate = config.sample_rate,
        forward_after_service = config.forward_after_service,
        "Dark traffic enabled"
    );
    Ok(Some(filter))
}

/// Like [`from_config`], as a chain: the identity chain when disabled.
pub fn chain_from_config(
    config: &DarkTrafficConfig,
) -> Result<FilterChain<HttpRequest, HttpResponse>, DarkTrafficError> {
    Ok(match from_config(config)? {
        Some(filter) => FilterChain::of(filter),
        None => FilterChain::identity(),
    })
}
