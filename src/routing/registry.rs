//! HTTP route registry and compiled route table.
//!
//! # Responsibilities
//! - Hold routes in registration order together with the global filters
//!   that were in effect when each was added
//! - Compile every route into its precomposed handler
//! - Look up `(interface, method, path)` with first-match-wins
//!
//! # Design Decisions
//! - Linear scan in registration order; route counts are small and order is
//!   the only precedence rule
//! - Admin and external routes share one table; the admin flag partitions
//!   lookups without duplicating storage
//! - The compiled table is immutable and read without locks

use std::collections::HashSet;

use axum::http::Method;

use crate::error::RouterError;
use crate::filter::{FilterChain, SharedHandler};
use crate::http::{HttpRequest, HttpResponse};
use crate::routing::matcher::{PathParams, PathPattern};
use crate::routing::route::{MatchedRoute, Route, RouteInfo};

/// Which listener a request arrived on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Interface {
    /// The public interface; serves non-admin routes.
    #[default]
    External,
    /// The administrative interface; serves admin routes.
    Admin,
}

impl Interface {
    fn serves(self, admin: bool) -> bool {
        match self {
            Interface::External => !admin,
            Interface::Admin => admin,
        }
    }
}

#[derive(PartialEq, Eq, Hash)]
struct RouteKey<'a> {
    method: &'a Method,
    template: &'a str,
    admin: bool,
}

impl<'a> RouteKey<'a> {
    fn of(route: &'a Route) -> Self {
        Self {
            method: route.method(),
            template: route.template(),
            admin: route.is_admin(),
        }
    }
}

struct PendingRoute {
    route: Route,
    global: FilterChain<HttpRequest, HttpResponse>,
}

/// Build-phase route collection.
#[derive(Default)]
pub struct RouteRegistry {
    pending: Vec<PendingRoute>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `route`, recording the global filters that will wrap it.
    pub fn register(
        &mut self,
        route: Route,
        global: FilterChain<HttpRequest, HttpResponse>,
    ) -> Result<(), RouterError> {
        self.register_all(vec![route], global)
    }

    /// Append every route of `routes`, or none of them if any is a duplicate
    /// of a registered route or of another route in the batch.
    pub fn register_all(
        &mut self,
        routes: Vec<Route>,
        global: FilterChain<HttpRequest, HttpResponse>,
    ) -> Result<(), RouterError> {
        let mut seen: HashSet<RouteKey<'_>> = self.pending.iter().map(|p| RouteKey::of(&p.route)).collect();
        if let Some(duplicate) = routes.iter().find(|r| !seen.insert(RouteKey::of(r))) {
            return Err(RouterError::DuplicateRoute {
                method: duplicate.method().to_string(),
                path: duplicate.template().to_string(),
            });
        }

        for route in routes {
            self.push(route, global.clone());
        }
        Ok(())
    }

    fn push(&mut self, route: Route, global: FilterChain<HttpRequest, HttpResponse>) {
        tracing::debug!(
            route = %route.name(),
            admin = route.is_admin(),
            global_filters = global.len(),
            route_filters = route.per_route_filters().len(),
            "Route registered"
        );
        self.pending.push(PendingRoute { route, global });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Compose every route as `outer → global → inner → per-route → callback`.
    pub fn compile(
        self,
        outer: &FilterChain<HttpRequest, HttpResponse>,
        inner: &FilterChain<HttpRequest, HttpResponse>,
    ) -> RouteTable {
        let routes = self
            .pending
            .into_iter()
            .map(|PendingRoute { route, global }| {
                let chain = outer
                    .clone()
                    .and_then(global)
                    .and_then(inner.clone())
                    .and_then(route.per_route_filters().clone());
                let callback = route.callback().clone();
                CompiledRoute {
                    composed: chain.compose(callback.clone()),
                    callback,
                    matched: route.matched(),
                    info: route.info(),
                    method: route.method().clone(),
                    pattern: route.pattern().clone(),
                    admin: route.is_admin(),
                }
            })
            .collect();

        RouteTable { routes }
    }
}

/// A route with its handlers composed and ready to serve.
pub struct CompiledRoute {
    method: Method,
    pattern: PathPattern,
    admin: bool,
    info: RouteInfo,
    matched: MatchedRoute,
    composed: SharedHandler<HttpRequest, HttpResponse>,
    callback: SharedHandler<HttpRequest, HttpResponse>,
}

impl CompiledRoute {
    pub fn info(&self) -> &RouteInfo {
        &self.info
    }

    pub fn matched(&self) -> &MatchedRoute {
        &self.matched
    }

    /// The full chain, or the bare callback when `bypass_filters` is set.
    pub fn handler(&self, bypass_filters: bool) -> &SharedHandler<HttpRequest, HttpResponse> {
        if bypass_filters {
            &self.callback
        } else {
            &self.composed
        }
    }
}

/// Immutable dispatch table.
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    /// First route on `interface` whose method and template match.
    pub fn lookup(&self, interface: Interface, method: &Method, path: &str) -> Option<(&CompiledRoute, PathParams)> {
        self.routes
            .iter()
            .filter(|r| interface.serves(r.admin) && r.method == *method)
            .find_map(|r| r.pattern.matches(path).map(|params| (r, params)))
    }

    pub fn routes(&self) -> impl Iterator<Item = &CompiledRoute> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
