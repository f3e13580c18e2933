//! HTTP-level middleware applied to every route.
//!
//! - `x-request-id`: generated when absent, echoed back, recorded on the request span
//! - Body size limit sized for gateway events; oversized bodies surface as extractor rejections
//! - Request timeout: an expired request answers the same 503 as a key backend outage

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::error_handling::HandleErrorLayer;
use axum::extract::DefaultBodyLimit;
use axum::http::{Request, header::HeaderName};
use axum::response::IntoResponse;
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
/// REQUEST events carry the caller's headers and request context; 64 KiB leaves ample room.
pub const EVENT_BODY_LIMIT_BYTES: usize = 64 * 1024;

pub fn apply(router: Router, request_timeout: Duration) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    let layers = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(
            request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(HandleErrorLayer::new(move |err: BoxError| async move {
            layer_error(err, request_timeout)
        }))
        .layer(TimeoutLayer::new(request_timeout));

    router
        .layer(DefaultBodyLimit::max(EVENT_BODY_LIMIT_BYTES))
        .layer(layers)
}

fn request_span(req: &Request<Body>) -> tracing::Span {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("n/a");

    tracing::info_span!(
        "http_request",
        method = %req.method(),
        path = %req.uri().path(),
        request_id = %request_id,
    )
}

fn layer_error(err: BoxError, request_timeout: Duration) -> axum::response::Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!(timeout_ms = request_timeout.as_millis() as u64, "request timed out");
        AppError::Unavailable.into_response()
    } else {
        tracing::error!(error = %err, "unhandled middleware error");
        AppError::Internal.into_response()
    }
}
