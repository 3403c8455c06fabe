use axum::{Router, routing::get};

use crate::api::v2::handlers::me::me;
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new().route("/auth/me", get(me));

    middleware::auth::access::apply(protected, state)
}
