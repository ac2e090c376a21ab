//! Dark destination clients.

use std::str::FromStr;

use axum::body::Body;
use axum::http::header::{HeaderName, HeaderValue, HOST};
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, Uri, Version};
use futures_util::future::{BoxFuture, FutureExt};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::dark_traffic::DarkTrafficError;
use crate::http::HttpRequest;

/// Header identifying the mirroring service to the dark destination.
pub const X_CLIENT_ID: HeaderName = HeaderName::from_static("x-client-id");

/// Sends mirrored requests to the dark destination.
///
/// Only the outcome matters; responses are discarded.
pub trait DarkClient<Req>: Send + Sync + 'static {
    fn send(&self, request: Req) -> BoxFuture<'static, Result<(), DarkTrafficError>>;
}

/// Parse `host:port` or `http://host[:port]` into an authority.
pub fn parse_destination(destination: &str) -> Result<Authority, DarkTrafficError> {
    let invalid = |reason: String| DarkTrafficError::InvalidDestination {
        destination: destination.to_string(),
        reason,
    };

    let with_scheme = if destination.contains("://") {
        destination.to_string()
    } else {
        format!("http://{destination}")
    };
    let url = url::Url::parse(&with_scheme).map_err(|e| invalid(e.to_string()))?;

    if url.scheme() != "http" {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    let host = url.host_str().ok_or_else(|| invalid("missing host".to_string()))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| invalid("missing port".to_string()))?;

    Authority::from_str(&format!("{host}:{port}")).map_err(|e| invalid(e.to_string()))
}

/// HTTP client for a fixed dark destination.
#[derive(Clone)]
pub struct HttpMirrorClient {
    client: Client<HttpConnector, Body>,
    authority: Authority,
    client_id: Option<HeaderValue>,
    mux_enabled: bool,
}

impl HttpMirrorClient {
    /// `mux_enabled` switches to multiplexed HTTP/2 (prior knowledge)
    /// connections; otherwise HTTP/1.1 with connection pooling.
    pub fn new(destination: &str, client_id: &str, mux_enabled: bool) -> Result<Self, DarkTrafficError> {
        let authority = parse_destination(destination)?;
        let client_id = if client_id.is_empty() {
            None
        } else {
            Some(
                HeaderValue::from_str(client_id).map_err(|e| DarkTrafficError::InvalidDestination {
                    destination: destination.to_string(),
                    reason: format!("invalid client id: {e}"),
                })?,
            )
        };

        let client = Client::builder(TokioExecutor::new())
            .http2_only(mux_enabled)
            .build(HttpConnector::new());

        tracing::info!(
            destination = %authority,
            mux_enabled,
            client_id = client_id.is_some(),
            "Dark traffic client created"
        );

        Ok(Self {
            client,
            authority,
            client_id,
            mux_enabled,
        })
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    fn rewrite(&self, request: HttpRequest) -> Result<Request<Body>, DarkTrafficError> {
        let (mut parts, body) = request.into_parts();

        let mut uri_parts = parts.uri.clone().into_parts();
        uri_parts.scheme = Some(Scheme::HTTP);
        uri_parts.authority = Some(self.authority.clone());
        if uri_parts.path_and_query.is_none() {
            uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        parts.uri = Uri::from_parts(uri_parts).map_err(axum::http::Error::from)?;

        parts.headers.remove(HOST);
        if let Some(client_id) = &self.client_id {
            parts.headers.insert(X_CLIENT_ID, client_id.clone());
        }
        parts.version = if self.mux_enabled {
            Version::HTTP_2
        } else {
            Version::HTTP_11
        };

        Ok(Request::from_parts(parts, Body::from(body)))
    }
}

impl DarkClient<HttpRequest> for HttpMirrorClient {
    fn send(&self, request: HttpRequest) -> BoxFuture<'static, Result<(), DarkTrafficError>> {
        let prepared = self.rewrite(request);
        let client = self.client.clone();

        async move {
            let response: hyper::Response<hyper::body::Incoming> = client.request(prepared?).await?;
            let status = response.status();
            if status.is_server_error() {
                return Err(DarkTrafficError::Status(status));
            }
            Ok(())
        }
        .boxed()
    }
}

impl std::fmt::Debug for HttpMirrorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMirrorClient")
            .field("authority", &self.authority)
            .field("mux_enabled", &self.mux_enabled)
            .finish()
    }
}
