//! Request handling helpers.
//!
//! # Responsibilities
//! - Buffer a streaming transport request into an `HttpRequest`
//! - Expose routing results (path parameters, matched route, request ID)
//! - Duplicate requests for dark-traffic mirroring
//!
//! # Design Decisions
//! - Body is buffered with a hard limit before dispatch
//! - Mirrored copies keep method, URI, version, headers and body; request
//!   extensions stay with the original

use axum::body::Body;
use axum::http::Request;

use crate::dark_traffic::Mirror;
use crate::http::HttpRequest;
use crate::routing::{MatchedRoute, PathParams};

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Buffer the request body, failing if it exceeds `limit` bytes.
pub async fn buffer(request: Request<Body>, limit: usize) -> Result<HttpRequest, axum::Error> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, limit).await?;
    Ok(Request::from_parts(parts, bytes))
}

/// Accessors for data the router attaches to a request.
pub trait RequestExt {
    /// Parameters bound by the matched route template.
    fn path_params(&self) -> Option<&PathParams>;

    /// A single path parameter.
    fn param(&self, name: &str) -> Option<&str> {
        self.path_params().and_then(|params| params.get(name))
    }

    /// The route that matched this request.
    fn matched_route(&self) -> Option<&MatchedRoute>;

    /// Value of the `x-request-id` header.
    fn request_id(&self) -> Option<&str>;
}

impl<B> RequestExt for Request<B> {
    fn path_params(&self) -> Option<&PathParams> {
        self.extensions().get::<PathParams>()
    }

    fn matched_route(&self) -> Option<&MatchedRoute> {
        self.extensions().get::<MatchedRoute>()
    }

    fn request_id(&self) -> Option<&str> {
        self.headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
    }
}

impl Mirror for HttpRequest {
    fn mirror(&self) -> Self {
        let mut mirrored = Request::new(self.body().clone());
        *mirrored.method_mut() = self.method().clone();
        *mirrored.uri_mut() = self.uri().clone();
        *mirrored.version_mut() = self.version();
        *mirrored.headers_mut() = self.headers().clone();
        mirrored
    }
}
