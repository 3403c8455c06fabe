/*
 * Responsibility
 * - API の URL 構造のトップ (/health, /api/versions, /api/v1, /api/v2)
 * - version を path に含まない route はここに置く
 * - /api/vN は policy が supported とする version だけ nest する
 */
use axum::{Router, routing::get};

use crate::middleware;
use crate::services::versioning::ApiVersion;
use crate::state::AppState;

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod v1;
pub mod v2;

use handlers::{health, me, versions};

pub fn routes(state: AppState) -> Router<AppState> {
    let negotiated = middleware::auth::access::apply(
        Router::new().route("/api/auth/me", get(me::me)),
        state.clone(),
    );

    let mut router = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .route("/api/versions", get(versions::versions))
        .merge(negotiated);

    let policy = state.versions.policy();
    if policy.is_supported(ApiVersion::new(1)) {
        router = router.nest("/api/v1", v1::routes(state.clone()));
    }
    if policy.is_supported(ApiVersion::new(2)) {
        router = router.nest("/api/v2", v2::routes(state.clone()));
    }

    router.fallback(versions::not_found)
}
