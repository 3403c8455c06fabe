/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (context / http / CORS / security headers)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware;
use crate::repos::{InMemoryUserStore, UserStore};
use crate::services::auth::{
    AccountService, Argon2PasswordHasher, CacheDenylist, PermissionResolver, TokenCodec,
    TokenDenylist, TokenService,
};
use crate::services::versioning::VersionNegotiator;
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,gatekeep=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get lost.
        tracing::error!(?info, "panic");

        // Development: crash the whole process so we notice immediately.
        // Production: default hook, the request gets a 500 from CatchPanicLayer.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("failed to load configuration")?;

    init_panic_hook(!config.app_env.is_production());

    info!(
        "starting API in {:?} mode on {}",
        config.app_env, config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build process-level services and inject them into the shared state.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let codec = Arc::new(TokenCodec::new(
        config.jwt_secret.as_bytes(),
        config.access_token_ttl_seconds,
        config.refresh_token_ttl_seconds,
    )?);

    let denylist: Arc<dyn TokenDenylist> = match &config.redis_url {
        Some(url) => {
            let denylist = CacheDenylist::connect(url)
                .await
                .context("failed to connect to the token denylist backend")?;
            info!(backend = denylist.backend_name(), "token denylist ready");
            Arc::new(denylist)
        }
        None => {
            info!(backend = "memory", "token denylist ready (process-local)");
            Arc::new(CacheDenylist::in_memory())
        }
    };

    let users: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());

    let tokens = Arc::new(TokenService::new(codec, denylist.clone(), users.clone()));
    let accounts = Arc::new(AccountService::new(
        users.clone(),
        Arc::new(Argon2PasswordHasher::new()),
        tokens.clone(),
    ));

    if let Some(admin) = &config.bootstrap_admin {
        accounts
            .ensure_admin(admin)
            .await
            .context("failed to seed bootstrap admin")?;
    }

    let permissions = Arc::new(PermissionResolver::new(config.permission_hierarchy.clone()));
    let versions = Arc::new(VersionNegotiator::new(config.version_policy.clone()));

    Ok(AppState::new(
        tokens,
        accounts,
        permissions,
        versions,
        users,
        denylist,
    ))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let versions = state.versions.clone();
    let router = api::routes(state.clone()).with_state(state);

    apply_layers(router, versions, config)
}

/// Layers, outermost first: context → http → cors → security headers → routes.
pub fn apply_layers(router: Router, versions: Arc<VersionNegotiator>, config: &Config) -> Router {
    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    let router = middleware::http::apply(router);
    middleware::context::apply(router, versions)
}
