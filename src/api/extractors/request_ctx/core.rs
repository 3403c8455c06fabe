use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::error;

use crate::error::AppError;
use crate::services::auth::token_codec::Claims;

use super::RequestContext;

/// Handler で RequestContext を受け取るための extractor
/// context middleware が request.extensions() に insert 済みである前提
/// 見つからない場合は配線ミスなので 500
pub struct Ctx(pub RequestContext);

impl<S> FromRequestParts<S> for Ctx
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .map(Ctx)
            .ok_or_else(|| {
                error!("request context missing; context middleware not applied");
                AppError::Internal
            })
    }
}

/// 認証済みリクエスト専用の extractor
/// claims が無ければ 401 (認証 middleware が掛かっていない route で使われた場合も含む)
pub struct Authenticated {
    ctx: RequestContext,
    claims: Arc<Claims>,
}

impl Authenticated {
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn ctx(&self) -> &RequestContext {
        &self.ctx
    }
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ctx(ctx) = Ctx::from_request_parts(parts, state).await?;
        let claims = ctx.shared_claims().ok_or(AppError::Unauthorized)?;

        Ok(Authenticated { ctx, claims })
    }
}
