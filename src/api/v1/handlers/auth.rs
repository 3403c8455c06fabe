/*
 * Responsibility
 * - /auth 系 handler (register / login / refresh / logout / me / change-password)
 * - DTO を受け、service 呼び出し、envelope に包んで返すだけ
 */
use axum::{extract::State, http::StatusCode};
use uuid::Uuid;

use crate::api::dto::ApiResponse;
use crate::api::extractors::{Authenticated, Ctx, JsonBody};
use crate::api::v1::dto::auth::{
    ChangePasswordRequest, LoginData, LoginRequest, RefreshTokenRequest, RegisterRequest, TokensData, UserData,
};
use crate::api::v1::dto::users::UserResponse;
use crate::error::AppError;
use crate::repos::UserRecord;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, ApiResponse<UserData>), AppError> {
    let user = state.accounts.register(req.into()).await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(
            &ctx,
            "Registration successful",
            UserData {
                user: UserResponse::from(&user),
            },
        ),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<ApiResponse<LoginData>, AppError> {
    let (user, tokens) = state.accounts.login(&req.email, &req.password).await?;

    Ok(ApiResponse::ok(
        &ctx,
        "Login successful",
        LoginData {
            tokens: tokens.into(),
            user: UserResponse::from(&user),
        },
    ))
}

pub async fn refresh(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    JsonBody(req): JsonBody<RefreshTokenRequest>,
) -> Result<ApiResponse<TokensData>, AppError> {
    let tokens = state.tokens.refresh(&req.refresh_token).await?;

    Ok(ApiResponse::ok(
        &ctx,
        "Token refreshed successfully",
        TokensData {
            tokens: tokens.into(),
        },
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    auth: Authenticated,
    JsonBody(req): JsonBody<RefreshTokenRequest>,
) -> Result<ApiResponse<()>, AppError> {
    state
        .tokens
        .revoke(&req.refresh_token, &auth.claims().sub)
        .await?;

    Ok(ApiResponse::message(auth.ctx(), "Logout successful"))
}

pub async fn change_password(
    State(state): State<AppState>,
    auth: Authenticated,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> Result<ApiResponse<()>, AppError> {
    let user = current_user(&state, &auth).await?;
    state
        .accounts
        .change_password(user.id, &req.current_password, &req.new_password)
        .await?;

    Ok(ApiResponse::message(auth.ctx(), "Password changed successfully"))
}

pub async fn me(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<ApiResponse<UserData>, AppError> {
    let user = current_user(&state, &auth).await?;

    Ok(ApiResponse::ok(
        auth.ctx(),
        "User information retrieved successfully",
        UserData {
            user: UserResponse::from(&user),
        },
    ))
}

/// The user behind a verified access token; a token whose subject is gone
/// or deactivated no longer authenticates.
pub(crate) async fn current_user(
    state: &AppState,
    auth: &Authenticated,
) -> Result<UserRecord, AppError> {
    let user_id = Uuid::parse_str(&auth.claims().sub).map_err(|_| AppError::Unauthorized)?;

    state
        .users
        .find_by_id(user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or(AppError::Unauthorized)
}
