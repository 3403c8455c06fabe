/*
 * Responsibility
 * - GET /health, /health/live (疎通用、依存先は見ない)
 * - GET /health/ready (依存先すべてが OK のときだけ 200)
 * - signing_key は実際に署名 → 検証できるかで判定する
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use crate::api::dto::ApiResponse;
use crate::api::extractors::Ctx;
use crate::state::AppState;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

pub async fn live(Ctx(ctx): Ctx) -> impl IntoResponse {
    ApiResponse::ok(&ctx, "Service is alive", json!({"status": "alive"}))
}

#[derive(Debug, Serialize)]
pub struct ReadinessChecks {
    pub signing_key: bool,
    pub user_store: bool,
    pub token_denylist: bool,
}

impl ReadinessChecks {
    pub fn all_ok(&self) -> bool {
        self.signing_key && self.user_store && self.token_denylist
    }
}

#[derive(Debug, Serialize)]
pub struct Readiness {
    pub ready: bool,
    pub checks: ReadinessChecks,
}

pub async fn ready(State(state): State<AppState>, Ctx(ctx): Ctx) -> impl IntoResponse {
    let user_store = match state.users.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "readiness: user store unreachable");
            false
        }
    };
    let token_denylist = match state.denylist.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "readiness: token denylist unreachable");
            false
        }
    };

    let signing_key = state.codec().self_check();
    if !signing_key {
        warn!("readiness: token signing self-check failed");
    }

    let checks = ReadinessChecks {
        signing_key,
        user_store,
        token_denylist,
    };
    let ready = checks.all_ok();

    let (status, message) = if ready {
        (StatusCode::OK, "Service is ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Service is not ready")
    };

    let mut body = ApiResponse::ok(&ctx, message, Readiness { ready, checks });
    body.success = ready;

    (status, body)
}
