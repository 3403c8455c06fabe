//! Request context stage (outermost layer).
//!
//! - negotiates the API version from path / headers
//! - inserts a fresh `RequestContext` into request extensions
//! - stamps `X-API-Version` and `X-Request-Id` on every response, including
//!   error responses produced by inner layers and the fallback
//! - adds `Deprecation` / `X-API-Deprecated-Version` / `Sunset` for
//!   deprecated versions

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request},
    middleware::{self, Next},
    response::Response,
};
use tracing::debug;

use crate::api::extractors::RequestContext;
use crate::services::versioning::{API_VERSION_HEADER, VersionNegotiator};

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
pub const DEPRECATION_HEADER: HeaderName = HeaderName::from_static("deprecation");
pub const DEPRECATED_VERSION_HEADER: HeaderName =
    HeaderName::from_static("x-api-deprecated-version");
pub const SUNSET_HEADER: HeaderName = HeaderName::from_static("sunset");

pub fn apply(router: Router, negotiator: Arc<VersionNegotiator>) -> Router {
    router.layer(middleware::from_fn_with_state(negotiator, request_context))
}

async fn request_context(
    State(negotiator): State<Arc<VersionNegotiator>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let negotiation = negotiator.negotiate(req.uri().path(), req.headers());
    let ctx = RequestContext::new(negotiation);
    let request_id = ctx.request_id();

    debug!(
        %request_id,
        api_version = %negotiation.version,
        source = ?negotiation.source,
        "api version negotiated"
    );

    req.extensions_mut().insert(ctx);

    let mut res = next.run(req).await;

    let policy = negotiator.policy();
    let headers = res.headers_mut();

    let version = HeaderValue::from_str(&negotiation.version.to_string()).ok();
    if let Some(v) = &version {
        headers.insert(API_VERSION_HEADER, v.clone());
    }
    if let Ok(v) = HeaderValue::from_str(&request_id.to_string()) {
        headers.insert(REQUEST_ID_HEADER, v);
    }

    if policy.is_deprecated(negotiation.version) {
        headers.insert(DEPRECATION_HEADER, HeaderValue::from_static("true"));
        if let Some(v) = version {
            headers.insert(DEPRECATED_VERSION_HEADER, v);
        }
        if let Some(v) = policy.sunset().and_then(|s| HeaderValue::from_str(s).ok()) {
            headers.insert(SUNSET_HEADER, v);
        }
    }

    res
}
