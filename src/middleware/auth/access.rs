//! access token (HS256 JWT) 検証 → claims 付きの RequestContext に置き換える
//!
//! - `Authorization: Bearer <jwt>` が無い / 形式が違う → 401 (codec には渡さない)
//! - 検証は TokenCodec::verify(.., Access)。refresh token はここで WrongType になる
//! - route_layer で掛けるので、存在しない path には走らない

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};
use tracing::{error, warn};

use crate::api::extractors::RequestContext;
use crate::error::AppError;
use crate::services::auth::TokenType;
use crate::state::AppState;

/// 認証が必要な route 群に access middleware を掛ける。
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers()).ok_or(AppError::Unauthorized)?;

    let claims = match state.codec().verify(token, TokenType::Access) {
        Ok(claims) => claims,
        Err(err) => {
            warn!(error = %err, "access token verification failed");
            return Err(err.into());
        }
    };

    let ctx = req
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.with_claims(claims))
        .ok_or_else(|| {
            error!("request context missing; context middleware not applied");
            AppError::Internal
        })?;

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

/// Scheme is matched case-insensitively; an empty token counts as missing.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
