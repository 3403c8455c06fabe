/*
 * Responsibility
 * - 成功レスポンスの共通 envelope `{success, message, data, api_version}`
 * - api_version は交渉済みの version (RequestContext) から埋める
 */
use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::api::extractors::RequestContext;
use crate::services::versioning::ApiVersion;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub api_version: ApiVersion,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(ctx: &RequestContext, message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            api_version: ctx.api_version(),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(ctx: &RequestContext, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            api_version: ctx.api_version(),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
