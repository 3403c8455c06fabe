/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /auth, /users, /admin を merge
 * - Bearer が必要な範囲は route_layer (middleware::auth::access) で囲う
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{
    admin::effective_permissions,
    auth::{change_password, login, logout, me, refresh, register},
    users::get_user,
};
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh));

    let protected = Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/auth/change-password", post(change_password))
        .route("/users/{user_id}", get(get_user))
        .route("/admin/permissions/effective", get(effective_permissions));

    public.merge(middleware::auth::access::apply(protected, state))
}
