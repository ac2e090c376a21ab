//! HTTP server setup.
//!
//! # Responsibilities
//! - Adapt a frozen `HttpRouter` into a tower `Service` over streaming bodies
//! - Turn dispatch errors into protocol responses (404 / 413 / 500)
//! - Serve one interface per listener with request tracing and graceful
//!   shutdown

use std::convert::Infallible;
use std::future::Future;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use futures_util::future::{BoxFuture, FutureExt};
use tokio::net::TcpListener;
use tower::Service;
use tower_http::trace::TraceLayer;

use crate::error::DispatchError;
use crate::http::request::buffer;
use crate::http::response::{error_response, into_transport};
use crate::routing::{DispatchOptions, HttpRouter, Interface};

/// Largest request body buffered by default (1 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Tower service dispatching transport requests through an `HttpRouter`.
#[derive(Clone, Debug)]
pub struct RouterService {
    router: HttpRouter,
    interface: Interface,
    body_limit: usize,
}

impl RouterService {
    /// Serve the external interface.
    pub fn new(router: HttpRouter) -> Self {
        Self {
            router,
            interface: Interface::External,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Serve the admin interface.
    pub fn admin(router: HttpRouter) -> Self {
        Self::new(router).interface(Interface::Admin)
    }

    pub fn interface(mut self, interface: Interface) -> Self {
        self.interface = interface;
        self
    }

    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Buffer, dispatch and convert the outcome into a transport response.
    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        let request = match buffer(request, self.body_limit).await {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, limit = self.body_limit, "Failed to buffer request body");
                return into_transport(error_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "request body too large or unreadable",
                ));
            }
        };

        let options = DispatchOptions {
            interface: self.interface,
            bypass_filters: false,
        };
        match self.router.dispatch_with(request, options).await {
            Ok(response) => into_transport(response),
            Err(e) if e.is_not_found() => into_transport(error_response(StatusCode::NOT_FOUND, &e.to_string())),
            Err(DispatchError::Unhandled(failure)) => {
                tracing::error!(error = %failure, "Failure escaped the filter chain");
                into_transport(error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"))
            }
            Err(e) => into_transport(error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())),
        }
    }
}

impl Service<Request<Body>> for RouterService {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let this = self.clone();
        async move { Ok(this.handle(request).await) }.boxed()
    }
}

/// HTTP server for one router interface.
pub struct HttpServer {
    app: axum::Router,
    interface: Interface,
}

impl HttpServer {
    pub fn new(service: RouterService) -> Self {
        let interface = service.interface;
        let app = axum::Router::new()
            .fallback_service(service)
            .layer(TraceLayer::new_for_http());
        Self { app, interface }
    }

    /// Accept connections on `listener` until `shutdown` resolves, then drain.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, interface = ?self.interface, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!(interface = ?self.interface, "HTTP server stopped");
        Ok(())
    }
}
