//! HTTP-level middleware (cross-cutting concerns).
//!
//! Transport/infrastructure concerns that apply to every route regardless
//! of API version.
//!
//! Responsibility:
//! - Access logging / request tracing (TraceLayer), tagged with the request
//!   id and negotiated version from the request context
//! - Global timeout
//! - Body size limit
//! - Panic to 500 conversion
//!
//! Request-id generation lives in the context stage, which wraps this one.

use std::any::Any;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::error_handling::HandleErrorLayer;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{Span, error, info_span};

use crate::api::extractors::RequestContext;
use crate::error::AppError;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Apply HTTP-level middleware to the given Router.
///
/// Defaults:
/// - Timeout: 30 seconds
/// - Body limit: 1 MiB
pub fn apply(router: Router) -> Router {
    let layers = ServiceBuilder::new()
        // Make the service error `Infallible` by converting errors into responses.
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                StatusCode::REQUEST_TIMEOUT
            } else {
                error!(error = %err, "unhandled service error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(CatchPanicLayer::custom(panic_response));

    router.layer(layers)
}

fn make_request_span(req: &Request<Body>) -> Span {
    let ctx = req.extensions().get::<RequestContext>();

    info_span!(
        "request",
        method = %req.method(),
        uri = %req.uri(),
        request_id = %ctx.map(|c| c.request_id().to_string()).unwrap_or_default(),
        api_version = %ctx.map(|c| c.api_version().to_string()).unwrap_or_default(),
    )
}

fn panic_response(_payload: Box<dyn Any + Send + 'static>) -> Response {
    // The panic hook has already logged the payload and location.
    AppError::Internal.into_response()
}
