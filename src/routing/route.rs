//! Route definitions.
//!
//! # Responsibilities
//! - Bind an HTTP method and URI template to a callback
//! - Carry the per-route filter chain and admin/index metadata
//! - Adapt typed JSON callbacks into plain request handlers
//!
//! # Design Decisions
//! - A route is immutable once added to a router
//! - Per-route filters sit innermost, next to the callback
//! - Declared request/response types are recorded as type names for listings

use std::future::Future;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::RouterError;
use crate::exception::{Failure, HttpException};
use crate::filter::{Filter, FilterChain, Handler, SharedHandler};
use crate::http::{response, HttpRequest, HttpResponse, RequestExt};
use crate::routing::matcher::{PathParams, PathPattern};

/// Identifies the route that matched a request; inserted into its extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute {
    pub name: Arc<str>,
    pub template: Arc<str>,
}

/// Serializable description of a registered route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub name: String,
    pub method: String,
    pub path: String,
    pub admin: bool,
    pub index: Option<String>,
    pub request_type: &'static str,
    pub response_type: &'static str,
}

/// An HTTP endpoint: method + template + callback.
pub struct Route {
    name: String,
    method: Method,
    pattern: PathPattern,
    admin: bool,
    index: Option<String>,
    request_type: &'static str,
    response_type: &'static str,
    filters: FilterChain<HttpRequest, HttpResponse>,
    callback: SharedHandler<HttpRequest, HttpResponse>,
}

impl Route {
    /// A route answering `method` requests on `template`.
    pub fn new<H>(method: Method, template: &str, callback: H) -> Result<Self, RouterError>
    where
        H: Handler<HttpRequest, HttpResponse>,
    {
        let pattern = PathPattern::compile(template)?;
        Ok(Self {
            name: format!("{} {}", method, template),
            method,
            pattern,
            admin: false,
            index: None,
            request_type: std::any::type_name::<HttpRequest>(),
            response_type: std::any::type_name::<HttpResponse>(),
            filters: FilterChain::identity(),
            callback: Arc::new(callback),
        })
    }

    pub fn get<H: Handler<HttpRequest, HttpResponse>>(template: &str, callback: H) -> Result<Self, RouterError> {
        Self::new(Method::GET, template, callback)
    }

    pub fn post<H: Handler<HttpRequest, HttpResponse>>(template: &str, callback: H) -> Result<Self, RouterError> {
        Self::new(Method::POST, template, callback)
    }

    pub fn put<H: Handler<HttpRequest, HttpResponse>>(template: &str, callback: H) -> Result<Self, RouterError> {
        Self::new(Method::PUT, template, callback)
    }

    pub fn delete<H: Handler<HttpRequest, HttpResponse>>(template: &str, callback: H) -> Result<Self, RouterError> {
        Self::new(Method::DELETE, template, callback)
    }

    /// A route whose body is decoded from JSON into `In` and whose result is
    /// encoded as a `200` JSON response.
    ///
    /// A body that fails to decode raises a `400` `HttpException`. An empty
    /// body decodes as JSON `null`, so `In = ()` or `Option<_>` accept it.
    pub fn json<In, Out, F, Fut>(method: Method, template: &str, callback: F) -> Result<Self, RouterError>
    where
        In: DeserializeOwned + Send + 'static,
        Out: Serialize + Send + 'static,
        F: Fn(In, PathParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Out, Failure>> + Send + 'static,
    {
        let callback = Arc::new(callback);
        let handler = move |request: HttpRequest| {
            let callback = callback.clone();
            async move {
                let params = request.path_params().cloned().unwrap_or_default();
                let body: &[u8] = if request.body().is_empty() {
                    b"null"
                } else {
                    request.body().as_ref()
                };
                let input: In = serde_json::from_slice(body)
                    .map_err(|e| HttpException::bad_request(format!("invalid request body: {e}")))?;

                let output = callback(input, params).await?;
                response::json(StatusCode::OK, &output).map_err(|e| Failure::from_boxed(Box::new(e)))
            }
        };

        let mut route = Self::new(method, template, handler)?;
        route.request_type = std::any::type_name::<In>();
        route.response_type = std::any::type_name::<Out>();
        Ok(route)
    }

    /// Override the generated `"<METHOD> <template>"` name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Serve this route on the admin interface only.
    pub fn admin(mut self) -> Self {
        self.admin = true;
        self
    }

    /// List this route in the admin index under `name`.
    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index = Some(name.into());
        self
    }

    /// Add a per-route filter, inside any previously added per-route filter.
    pub fn filter<F: Filter<HttpRequest, HttpResponse>>(mut self, filter: F) -> Self {
        self.filters = self.filters.with(filter);
        self
    }

    /// Append a chain of per-route filters.
    pub fn filters(mut self, chain: FilterChain<HttpRequest, HttpResponse>) -> Self {
        self.filters = self.filters.and_then(chain);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn template(&self) -> &str {
        self.pattern.template()
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    pub fn index_name(&self) -> Option<&str> {
        self.index.as_deref()
    }

    pub fn info(&self) -> RouteInfo {
        RouteInfo {
            name: self.name.clone(),
            method: self.method.to_string(),
            path: self.template().to_string(),
            admin: self.admin,
            index: self.index.clone(),
            request_type: self.request_type,
            response_type: self.response_type,
        }
    }

    pub(crate) fn matched(&self) -> MatchedRoute {
        MatchedRoute {
            name: Arc::from(self.name.as_str()),
            template: Arc::from(self.template()),
        }
    }

    pub(crate) fn per_route_filters(&self) -> &FilterChain<HttpRequest, HttpResponse> {
        &self.filters
    }

    pub(crate) fn callback(&self) -> &SharedHandler<HttpRequest, HttpResponse> {
        &self.callback
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("admin", &self.admin)
            .field("filters", &self.filters)
            .finish()
    }
}
