//! HTTP router façade.
//!
//! # Responsibilities
//! - Accumulate global filters, exception mappers and routes
//! - Freeze them into an immutable `HttpRouter`
//! - Dispatch requests through the matched route's precomposed handler
//!
//! # State Machine
//! ```text
//! Building ──freeze()──▶ Frozen
//!   filter / exception_mapper / add / add_controller: Building only
//!   any mutator (or a second freeze) while Frozen → RouterError::Frozen
//! ```
//!
//! # Design Decisions
//! - A route is wrapped by the global filters added *before* it; filters
//!   added later never wrap it retroactively
//! - Exception mapping is always the outermost stage, and runs again just
//!   inside the global filters so they observe mapped responses
//! - `add_controller` registers all of a controller's routes or none
//! - `HttpRouter` only exists after freezing, so no dispatch can observe a
//!   partially built table; it is cheap to clone and shares the table by `Arc`

use std::sync::Arc;

use futures_util::future::{self, BoxFuture, FutureExt};

use crate::error::{DispatchError, RouterError};
use crate::exception::http::{default_mapper, http_exception_mapper};
use crate::exception::{Exception, ExceptionMapper, ExceptionMappers, HttpException};
use crate::filter::{ExceptionMappingFilter, Filter, FilterChain};
use crate::http::{HttpRequest, HttpResponse};
use crate::observability::metrics;
use crate::routing::registry::{Interface, RouteRegistry, RouteTable};
use crate::routing::route::{Route, RouteInfo};

/// A group of related routes registered together.
pub trait Controller: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// The routes this controller serves, in registration order.
    fn routes(self: Arc<Self>) -> Result<Vec<Route>, RouterError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildState {
    Building,
    Frozen,
}

/// Per-dispatch options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    pub interface: Interface,
    /// Call the route callback directly, skipping every filter including
    /// exception mapping. Only for internal callers such as benchmarks.
    pub bypass_filters: bool,
}

impl DispatchOptions {
    pub fn admin() -> Self {
        Self {
            interface: Interface::Admin,
            bypass_filters: false,
        }
    }

    pub fn bypassing_filters(mut self) -> Self {
        self.bypass_filters = true;
        self
    }
}

/// Entry in the admin index.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AdminIndexEntry {
    pub name: String,
    pub path: String,
}

/// Mutable build phase of an HTTP router.
pub struct HttpRouterBuilder {
    state: BuildState,
    filters: FilterChain<HttpRequest, HttpResponse>,
    mappers: ExceptionMappers<HttpResponse>,
    registry: RouteRegistry,
}

impl HttpRouterBuilder {
    /// A builder with `HttpException` and catch-all mappers pre-registered.
    pub fn new() -> Self {
        let mut mappers = ExceptionMappers::new();
        mappers.register::<HttpException, _>(http_exception_mapper);
        mappers.register_default(default_mapper);

        Self {
            state: BuildState::Building,
            filters: FilterChain::identity(),
            mappers,
            registry: RouteRegistry::new(),
        }
    }

    fn ensure_building(&self) -> Result<(), RouterError> {
        match self.state {
            BuildState::Building => Ok(()),
            BuildState::Frozen => Err(RouterError::Frozen),
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.state == BuildState::Frozen
    }

    /// Add a global filter. It wraps only routes added after this call.
    pub fn filter<F: Filter<HttpRequest, HttpResponse>>(&mut self, filter: F) -> Result<&mut Self, RouterError> {
        self.ensure_building()?;
        self.filters = std::mem::take(&mut self.filters).with(filter);
        Ok(self)
    }

    /// Add a chain of global filters, in order.
    pub fn filters(&mut self, chain: FilterChain<HttpRequest, HttpResponse>) -> Result<&mut Self, RouterError> {
        self.ensure_building()?;
        self.filters = std::mem::take(&mut self.filters).and_then(chain);
        Ok(self)
    }

    /// Map failures of type `E` (and types deriving from it) with `mapper`.
    pub fn exception_mapper<E, M>(&mut self, mapper: M) -> Result<&mut Self, RouterError>
    where
        E: Exception,
        M: ExceptionMapper<HttpResponse>,
    {
        self.ensure_building()?;
        self.mappers.register::<E, M>(mapper);
        Ok(self)
    }

    /// Replace the catch-all mapper.
    pub fn default_exception_mapper<M: ExceptionMapper<HttpResponse>>(
        &mut self,
        mapper: M,
    ) -> Result<&mut Self, RouterError> {
        self.ensure_building()?;
        self.mappers.register_default(mapper);
        Ok(self)
    }

    /// Add a route, wrapped by every global filter added so far.
    pub fn add(&mut self, route: Route) -> Result<&mut Self, RouterError> {
        self.ensure_building()?;
        self.registry.register(route, self.filters.clone())?;
        Ok(self)
    }

    /// Add every route of `controller`, or none of them if any is rejected.
    pub fn add_controller<C: Controller>(&mut self, controller: C) -> Result<&mut Self, RouterError> {
        self.ensure_building()?;
        let controller = Arc::new(controller);
        let name = controller.name().to_string();
        let routes = controller.routes()?;
        if routes.is_empty() {
            tracing::warn!(controller = %name, "Controller declares no routes");
        }
        self.registry.register_all(routes, self.filters.clone())?;
        Ok(self)
    }

    /// Freeze into an immutable router. Later mutators fail with `Frozen`.
    pub fn freeze(&mut self) -> Result<HttpRouter, RouterError> {
        self.ensure_building()?;
        let resolver = Arc::new(self.mappers.build()?);
        self.state = BuildState::Frozen;

        let outer = FilterChain::of(ExceptionMappingFilter::new(resolver.clone()));
        let inner = FilterChain::of(ExceptionMappingFilter::new(resolver));
        let table = std::mem::take(&mut self.registry).compile(&outer, &inner);
        self.filters = FilterChain::identity();

        tracing::info!(
            routes = table.len(),
            admin_routes = table.routes().filter(|r| r.info().admin).count(),
            "HTTP router frozen"
        );

        Ok(HttpRouter {
            table: Arc::new(table),
        })
    }
}

impl Default for HttpRouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Frozen HTTP dispatch table.
#[derive(Clone)]
pub struct HttpRouter {
    table: Arc<RouteTable>,
}

impl HttpRouter {
    pub fn builder() -> HttpRouterBuilder {
        HttpRouterBuilder::new()
    }

    /// Dispatch on the external interface with all filters.
    pub fn dispatch(&self, request: HttpRequest) -> BoxFuture<'static, Result<HttpResponse, DispatchError>> {
        self.dispatch_with(request, DispatchOptions::default())
    }

    /// Dispatch on the admin interface with all filters.
    pub fn dispatch_admin(&self, request: HttpRequest) -> BoxFuture<'static, Result<HttpResponse, DispatchError>> {
        self.dispatch_with(request, DispatchOptions::admin())
    }

    pub fn dispatch_with(
        &self,
        mut request: HttpRequest,
        options: DispatchOptions,
    ) -> BoxFuture<'static, Result<HttpResponse, DispatchError>> {
        let Some((route, params)) = self
            .table
            .lookup(options.interface, request.method(), request.uri().path())
        else {
            let method = request.method().to_string();
            let path = request.uri().path().to_string();
            tracing::debug!(method = %method, path = %path, interface = ?options.interface, "No route matched");
            metrics::record_route_not_found(options.interface);
            return future::ready(Err(DispatchError::RouteNotFound { method, path })).boxed();
        };

        request.extensions_mut().insert(params);
        request.extensions_mut().insert(route.matched().clone());
        let handler = route.handler(options.bypass_filters).clone();

        async move { handler.call(request).await.map_err(DispatchError::Unhandled) }.boxed()
    }

    /// Every registered route, in registration order.
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.table.routes().map(|r| r.info().clone()).collect()
    }

    /// Routes that asked to be listed in the admin index.
    pub fn admin_index(&self) -> Vec<AdminIndexEntry> {
        self.table
            .routes()
            .filter_map(|r| {
                let info = r.info();
                info.index.as_ref().map(|name| AdminIndexEntry {
                    name: name.clone(),
                    path: info.path.clone(),
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for HttpRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRouter")
            .field("routes", &self.table.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::Failure;
    use crate::filter::filter_fn;
    use crate::http::response;
    use axum::body::Bytes;
    use axum::http::{Method, Request, StatusCode};

    fn ok_route(template: &str) -> Route {
        Route::get(template, |_req: HttpRequest| async move {
            Ok::<_, Failure>(response::empty(StatusCode::OK))
        })
        .unwrap()
    }

    fn noop_filter() -> impl Filter<HttpRequest, HttpResponse> {
        filter_fn(|req: HttpRequest, next: crate::filter::Next<HttpRequest, HttpResponse>| async move {
            next.run(req).await
        })
    }

    #[test]
    fn test_mutators_fail_after_freeze() {
        let mut builder = HttpRouter::builder();
        builder.add(ok_route("/a")).unwrap();
        builder.freeze().unwrap();

        assert!(builder.is_frozen());
        assert!(matches!(builder.filter(noop_filter()), Err(RouterError::Frozen)));
        assert!(matches!(builder.add(ok_route("/b")), Err(RouterError::Frozen)));
        assert!(matches!(
            builder.exception_mapper::<HttpException, _>(http_exception_mapper),
            Err(RouterError::Frozen)
        ));
        assert!(matches!(builder.default_exception_mapper(default_mapper), Err(RouterError::Frozen)));
        assert!(matches!(builder.freeze(), Err(RouterError::Frozen)));
    }

    #[tokio::test]
    async fn test_admin_index_lists_indexed_routes() {
        let mut builder = HttpRouter::builder();
        builder
            .add(ok_route("/admin/routes").admin().index("Routes"))
            .unwrap()
            .add(ok_route("/admin/ping").admin())
            .unwrap();
        let router = builder.freeze().unwrap();

        assert_eq!(
            router.admin_index(),
            vec![AdminIndexEntry {
                name: "Routes".into(),
                path: "/admin/routes".into()
            }]
        );

        let request = Request::builder()
            .method(Method::GET)
            .uri("/admin/ping")
            .body(Bytes::new())
            .unwrap();
        assert!(matches!(
            router.dispatch(request).await,
            Err(DispatchError::RouteNotFound { .. })
        ));

        let request = Request::builder()
            .method(Method::GET)
            .uri("/admin/ping")
            .body(Bytes::new())
            .unwrap();
        assert_eq!(router.dispatch_admin(request).await.unwrap().status(), StatusCode::OK);
    }
}
