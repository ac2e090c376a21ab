//! Filter chain composition.
//!
//! # Data Flow
//! ```text
//! FilterChain [F1, F2] + terminal T
//!     → compose() folds from the innermost filter outwards
//!     → F1(req, next=F2(req, next=T))
//!
//! Request:   F1.pre → F2.pre → T
//! Response:  T → F2.post → F1.post
//! ```
//!
//! # Design Decisions
//! - Continuation passing: a filter receives the request and a `Next` it may
//!   run zero, one or several times
//! - Every stage returns a `BoxFuture`; composing never blocks or awaits
//! - Chains are plain ordered lists, so `and_then` is associative and the
//!   empty chain is the identity (composing it returns the terminal as is)
//! - Composition happens once, when a router freezes; dispatch only calls
//!   the precomputed handler

pub mod exception_mapping;
pub mod logging;
pub mod request_id;
pub mod stats;

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

use crate::exception::Failure;

pub use exception_mapping::ExceptionMappingFilter;
pub use logging::LoggingFilter;
pub use request_id::RequestIdFilter;
pub use stats::StatsFilter;

/// A request handler producing a deferred response.
///
/// Implemented for any `Fn(Req) -> impl Future<Output = Result<Rep, Failure>>`.
pub trait Handler<Req, Rep>: Send + Sync + 'static {
    fn call(&self, request: Req) -> BoxFuture<'static, Result<Rep, Failure>>;
}

impl<Req, Rep, F, Fut> Handler<Req, Rep> for F
where
    F: Fn(Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Rep, Failure>> + Send + 'static,
{
    fn call(&self, request: Req) -> BoxFuture<'static, Result<Rep, Failure>> {
        (self)(request).boxed()
    }
}

/// Shared, type-erased handler.
pub type SharedHandler<Req, Rep> = Arc<dyn Handler<Req, Rep>>;

/// Middleware wrapping the next stage of a chain.
pub trait Filter<Req, Rep>: Send + Sync + 'static {
    fn apply(&self, request: Req, next: Next<Req, Rep>) -> BoxFuture<'static, Result<Rep, Failure>>;
}

/// The remainder of the chain, as seen from inside a filter.
pub struct Next<Req, Rep> {
    inner: SharedHandler<Req, Rep>,
}

impl<Req: 'static, Rep: 'static> Next<Req, Rep> {
    /// Run the rest of the chain. May be called any number of times.
    pub fn run(&self, request: Req) -> BoxFuture<'static, Result<Rep, Failure>> {
        self.inner.call(request)
    }
}

impl<Req, Rep> Clone for Next<Req, Rep> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Adapt an async closure into a `Filter`.
///
/// ```
/// use request_router::filter::{filter_fn, Next};
/// use request_router::http::{HttpRequest, HttpResponse};
///
/// let timing = filter_fn(|req: HttpRequest, next: Next<HttpRequest, HttpResponse>| async move {
///     let start = std::time::Instant::now();
///     let response = next.run(req).await;
///     tracing::debug!(elapsed = ?start.elapsed(), "handled");
///     response
/// });
/// # let _ = timing;
/// ```
pub fn filter_fn<Req, Rep, F, Fut>(f: F) -> FilterFn<F, Req, Rep>
where
    F: Fn(Req, Next<Req, Rep>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Rep, Failure>> + Send + 'static,
{
    FilterFn {
        f,
        _types: PhantomData,
    }
}

/// A filter built from a closure; see [`filter_fn`].
pub struct FilterFn<F, Req, Rep> {
    f: F,
    _types: PhantomData<fn(Req) -> Rep>,
}

impl<F, Req, Rep, Fut> Filter<Req, Rep> for FilterFn<F, Req, Rep>
where
    F: Fn(Req, Next<Req, Rep>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Rep, Failure>> + Send + 'static,
    Req: 'static,
    Rep: 'static,
{
    fn apply(&self, request: Req, next: Next<Req, Rep>) -> BoxFuture<'static, Result<Rep, Failure>> {
        (self.f)(request, next).boxed()
    }
}

/// An ordered sequence of filters; earlier filters wrap later ones.
pub struct FilterChain<Req, Rep> {
    filters: Vec<Arc<dyn Filter<Req, Rep>>>,
}

impl<Req: 'static, Rep: 'static> FilterChain<Req, Rep> {
    /// The empty chain.
    pub fn identity() -> Self {
        Self { filters: Vec::new() }
    }

    /// A chain holding a single filter.
    pub fn of<F: Filter<Req, Rep>>(filter: F) -> Self {
        Self::identity().with(filter)
    }

    /// Append a filter innermost.
    pub fn with<F: Filter<Req, Rep>>(mut self, filter: F) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    pub fn push(&mut self, filter: Arc<dyn Filter<Req, Rep>>) {
        self.filters.push(filter);
    }

    /// `self`'s filters followed by `other`'s.
    pub fn and_then(mut self, other: FilterChain<Req, Rep>) -> Self {
        self.filters.extend(other.filters);
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Wrap `terminal` in every filter of the chain.
    pub fn compose(&self, terminal: SharedHandler<Req, Rep>) -> SharedHandler<Req, Rep> {
        self.filters.iter().rev().fold(terminal, |inner, filter| {
            Arc::new(Filtered {
                filter: filter.clone(),
                next: Next { inner },
            })
        })
    }
}

impl<Req, Rep> Clone for FilterChain<Req, Rep> {
    fn clone(&self) -> Self {
        Self {
            filters: self.filters.clone(),
        }
    }
}

impl<Req: 'static, Rep: 'static> Default for FilterChain<Req, Rep> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<Req, Rep> fmt::Debug for FilterChain<Req, Rep> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("len", &self.filters.len())
            .finish()
    }
}

/// One filter bound to the rest of its chain.
struct Filtered<Req, Rep> {
    filter: Arc<dyn Filter<Req, Rep>>,
    next: Next<Req, Rep>,
}

impl<Req: 'static, Rep: 'static> Handler<Req, Rep> for Filtered<Req, Rep> {
    fn call(&self, request: Req) -> BoxFuture<'static, Result<Rep, Failure>> {
        self.filter.apply(request, self.next.clone())
    }
}
