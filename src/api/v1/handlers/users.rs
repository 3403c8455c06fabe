/*
 * Responsibility
 * - GET /users/{user_id} (user:read か system:read のどちらかが必要)
 * - users は UUID をそのまま扱う
 */
use axum::extract::{Path, State};
use uuid::Uuid;

use crate::api::dto::ApiResponse;
use crate::api::extractors::Authenticated;
use crate::api::v1::dto::auth::UserData;
use crate::api::v1::dto::users::UserResponse;
use crate::error::AppError;
use crate::middleware::auth::require_any;
use crate::services::auth::permissions::{SYSTEM_READ, USER_READ};
use crate::state::AppState;

pub async fn get_user(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<UserData>, AppError> {
    require_any(&state.permissions, auth.claims(), &[USER_READ, SYSTEM_READ])?;

    let user_id = Uuid::parse_str(&user_id)
        .map_err(|_| AppError::InvalidRequest("user_id must be a UUID".into()))?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::ok(
        auth.ctx(),
        "User retrieved successfully",
        UserData {
            user: UserResponse::from(&user),
        },
    ))
}
