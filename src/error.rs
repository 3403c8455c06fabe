/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - token / permission / store のエラーを統一的に変換
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::repos::error::RepoError;
use crate::services::auth::denylist::DenylistError;
use crate::services::auth::password::HashError;
use crate::services::auth::token_codec::{AuthError, SignError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A bearer token was presented and rejected.
    #[error("{0}")]
    Authentication(#[from] AuthError),

    /// No usable credentials (missing header, bad login, revoked token).
    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorResponseBody {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Authentication(AuthError::Expired) => {
                (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED")
            }
            AppError::Authentication(AuthError::MalformedOrTampered) => {
                (StatusCode::UNAUTHORIZED, "INVALID_TOKEN")
            }
            AppError::Authentication(AuthError::WrongType { .. }) => {
                (StatusCode::UNAUTHORIZED, "WRONG_TOKEN_TYPE")
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = ErrorResponseBody {
            error: ErrorBody {
                code,
                message: self.to_string(),
            },
        };

        let mut res = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            res.headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        res
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => AppError::Conflict,
            RepoError::Unavailable(reason) => {
                error!(%reason, "user store unavailable");
                AppError::Internal
            }
        }
    }
}

impl From<DenylistError> for AppError {
    fn from(e: DenylistError) -> Self {
        // fail closed
        error!(error = %e, "token denylist unavailable");
        AppError::Internal
    }
}

impl From<SignError> for AppError {
    fn from(_: SignError) -> Self {
        AppError::Internal
    }
}

impl From<HashError> for AppError {
    fn from(e: HashError) -> Self {
        error!(error = %e, "password hashing failed");
        AppError::Internal
    }
}
