//! Request correlation IDs.

use axum::http::HeaderValue;
use futures_util::future::{BoxFuture, FutureExt};
use uuid::Uuid;

use crate::exception::Failure;
use crate::filter::{Filter, Next};
use crate::http::{HttpRequest, HttpResponse, RequestExt, X_REQUEST_ID};

/// Ensures every request carries an `x-request-id` and echoes it on the response.
///
/// An incoming ID is kept; otherwise a UUID v4 is generated.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdFilter;

impl Filter<HttpRequest, HttpResponse> for RequestIdFilter {
    fn apply(
        &self,
        mut request: HttpRequest,
        next: Next<HttpRequest, HttpResponse>,
    ) -> BoxFuture<'static, Result<HttpResponse, Failure>> {
        let request_id = match request.request_id() {
            Some(id) => id.to_owned(),
            None => {
                let id = Uuid::new_v4().to_string();
                if let Ok(value) = HeaderValue::from_str(&id) {
                    request.headers_mut().insert(X_REQUEST_ID, value);
                }
                id
            }
        };

        async move {
            let mut response = next.run(request).await?;
            if let Ok(value) = HeaderValue::from_str(&request_id) {
                response.headers_mut().insert(X_REQUEST_ID, value);
            }
            Ok(response)
        }
        .boxed()
    }
}
