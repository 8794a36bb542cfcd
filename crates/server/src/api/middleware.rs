//! Request metrics middleware and header extractors.

use axum::{
    body::Body,
    extract::{FromRequestParts, MatchedPath},
    http::{request::Parts, Request},
    middleware::Next,
    response::Response,
};
use std::future::Future;
use std::time::Instant;

use crate::metrics::{HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION};

/// Metrics middleware that tracks HTTP request duration and counts.
///
/// Paths are labelled with the matched route template ("/artworks/{id}"),
/// never the raw URI, to keep label cardinality bounded.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    HTTP_REQUESTS_IN_FLIGHT.inc();

    let response = next.run(request).await;

    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

/// Extractor for the uploader identity.
///
/// Reads the opaque `x-user-id` header; uploads without it are anonymous.
#[derive(Debug, Clone)]
pub struct UploadOwner(pub Option<String>);

impl<S> FromRequestParts<S> for UploadOwner
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let owner = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string());
        std::future::ready(Ok(UploadOwner(owner)))
    }
}
