//! Response construction helpers.
//!
//! # Design Decisions
//! - Error bodies share one JSON shape: `{"errors": ["message"]}`
//! - Helpers never panic; header values are static

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Response, StatusCode};
use serde::Serialize;

use crate::http::HttpResponse;

const APPLICATION_JSON: &str = "application/json";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// A response with the given status, content type and body.
pub fn response(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> HttpResponse {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// A bodiless response.
pub fn empty(status: StatusCode) -> HttpResponse {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status;
    response
}

pub fn text(status: StatusCode, body: impl Into<String>) -> HttpResponse {
    let body: String = body.into();
    response(status, TEXT_PLAIN, body)
}

/// Serialize `value` as a JSON response.
pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Result<HttpResponse, serde_json::Error> {
    let body = serde_json::to_vec(value)?;
    Ok(response(status, APPLICATION_JSON, body))
}

/// The JSON error body used by exception mappers and the transport.
pub fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    let body = serde_json::json!({ "errors": [message] }).to_string();
    response(status, APPLICATION_JSON, body)
}

/// Hand a buffered response back to the transport.
pub fn into_transport(response: HttpResponse) -> Response<Body> {
    response.map(Body::from)
}
