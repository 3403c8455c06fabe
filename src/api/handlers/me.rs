/*
 * Responsibility
 * - path に version を含まない GET /api/auth/me
 * - 交渉済み version (header / Accept / default) で v1 / v2 の handler に振り分ける
 */
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};

use crate::api::extractors::Authenticated;
use crate::api::{v1, v2};
use crate::error::AppError;
use crate::state::AppState;

pub async fn me(state: State<AppState>, auth: Authenticated) -> Result<Response, AppError> {
    // v2 is the newest shape; any later supported version gets it too.
    if auth.ctx().api_version().ordinal() >= 2 {
        Ok(v2::handlers::me::me(state, auth).await?.into_response())
    } else {
        Ok(v1::handlers::auth::me(state, auth).await?.into_response())
    }
}
