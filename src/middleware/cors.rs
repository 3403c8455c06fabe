//! CORS policy for browser clients.
//!
//! Policy:
//! - Development: permissive (Allow-Origin: *), WITHOUT credentials.
//! - Production: allowlist origins from Config (comma-separated env var), WITHOUT credentials.
//!
//! Browsers may send `X-API-Version` and read back the negotiated version,
//! the request id and the deprecation headers.

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Config;
use crate::middleware::context::{
    DEPRECATED_VERSION_HEADER, DEPRECATION_HEADER, REQUEST_ID_HEADER, SUNSET_HEADER,
};
use crate::services::versioning::API_VERSION_HEADER;

/// Apply CORS policy to the given Router.
///
/// Do not combine wildcard origin (`Any`) with `allow_credentials(true)`.
pub fn apply(router: Router, config: &Config) -> Router {
    let cors = if config.app_env.is_production() {
        // An empty allowlist allows no origin at all.
        let allowed: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _req| {
            allowed.iter().any(|v| v == origin)
        });

        CorsLayer::new().allow_origin(allow_origin)
    } else {
        CorsLayer::new().allow_origin(Any)
    }
    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
    .allow_headers([
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        header::ACCEPT,
        API_VERSION_HEADER,
    ])
    .expose_headers([
        API_VERSION_HEADER,
        REQUEST_ID_HEADER,
        DEPRECATION_HEADER,
        DEPRECATED_VERSION_HEADER,
        SUNSET_HEADER,
    ])
    .max_age(std::time::Duration::from_secs(60 * 10));

    router.layer(cors)
}
