/*
 * Responsibility
 * - GET /auth/me の v2 形
 * - v1 の user に加えて、hierarchy で閉じた実効 permission を返す
 */
use std::collections::BTreeSet;

use axum::extract::State;
use serde::Serialize;

use crate::api::dto::ApiResponse;
use crate::api::extractors::Authenticated;
use crate::api::v1::dto::users::UserResponse;
use crate::api::v1::handlers::auth::current_user;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MeData {
    pub user: UserResponse,
    pub effective_permissions: BTreeSet<String>,
}

pub async fn me(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<ApiResponse<MeData>, AppError> {
    let user = current_user(&state, &auth).await?;
    let effective_permissions = state.permissions.close(&auth.claims().permissions);

    Ok(ApiResponse::ok(
        auth.ctx(),
        "User information retrieved successfully",
        MeData {
            user: UserResponse::from(&user),
            effective_permissions,
        },
    ))
}
