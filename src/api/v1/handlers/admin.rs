use std::collections::BTreeSet;

use axum::extract::State;
use serde::Serialize;

use crate::api::dto::ApiResponse;
use crate::api::extractors::Authenticated;
use crate::error::AppError;
use crate::middleware::auth::require_all;
use crate::services::auth::permissions::SYSTEM_READ;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EffectivePermissions {
    pub sub: String,
    /// As carried in the token.
    pub granted: BTreeSet<String>,
    /// Closed over the permission hierarchy.
    pub effective: BTreeSet<String>,
}

/// GET /admin/permissions/effective (system:read)
pub async fn effective_permissions(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<ApiResponse<EffectivePermissions>, AppError> {
    let claims = auth.claims();
    require_all(&state.permissions, claims, &[SYSTEM_READ])?;

    Ok(ApiResponse::ok(
        auth.ctx(),
        "Effective permissions resolved",
        EffectivePermissions {
            sub: claims.sub.clone(),
            granted: claims.permissions.clone(),
            effective: state.permissions.close(&claims.permissions),
        },
    ))
}
