//! HTTP exceptions and the mappers the HTTP router registers by default.

use axum::http::StatusCode;

use crate::exception::{Exception, Failure};
use crate::http::response::error_response;
use crate::http::HttpResponse;

/// A failure that carries the HTTP status it should be answered with.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{status}: {message}")]
pub struct HttpException {
    pub status: StatusCode,
    pub message: String,
}

impl Exception for HttpException {}

impl HttpException {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }
}

/// Answers an `HttpException` with its own status and message.
///
/// Types that declare `HttpException` as their supertype carry no status of
/// their own, so they are answered with `500`.
pub fn http_exception_mapper(failure: &Failure) -> HttpResponse {
    match failure.downcast_ref::<HttpException>() {
        Some(e) => error_response(e.status, &e.message),
        None => error_response(StatusCode::INTERNAL_SERVER_ERROR, &failure.to_string()),
    }
}

/// The catch-all mapper: `500` with a generic body.
pub fn default_mapper(failure: &Failure) -> HttpResponse {
    tracing::error!(error = %failure, "Unhandled failure while dispatching request");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}
