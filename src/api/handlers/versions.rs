use axum::{extract::State, response::IntoResponse};

use crate::api::dto::ApiResponse;
use crate::api::extractors::Ctx;
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/versions
pub async fn versions(State(state): State<AppState>, Ctx(ctx): Ctx) -> impl IntoResponse {
    ApiResponse::ok(
        &ctx,
        "API version information",
        state.versions.policy().info(),
    )
}

/// Router fallback. Goes through the same layers, so it is versioned too.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
