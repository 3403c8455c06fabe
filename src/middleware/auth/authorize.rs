//! Authorization predicates, called explicitly by each handler.
//!
//! Claims carry the user's direct grants; the resolver closes them over the
//! permission hierarchy before checking.

use tracing::warn;

use crate::error::AppError;
use crate::services::auth::{Claims, PermissionResolver};

/// Every permission in `required` must be held.
pub fn require_all(
    resolver: &PermissionResolver,
    claims: &Claims,
    required: &[&str],
) -> Result<(), AppError> {
    if resolver.has_all(&claims.permissions, required) {
        return Ok(());
    }
    warn!(sub = %claims.sub, ?required, "permission denied");
    Err(AppError::Forbidden)
}

/// At least one permission in `required` must be held.
pub fn require_any(
    resolver: &PermissionResolver,
    claims: &Claims,
    required: &[&str],
) -> Result<(), AppError> {
    if resolver.has_any(&claims.permissions, required) {
        return Ok(());
    }
    warn!(sub = %claims.sub, ?required, "permission denied");
    Err(AppError::Forbidden)
}
