/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config読み込み → 依存生成 (identity store, TokenCodec) → Router 組み立て
 * - Middleware の適用順 (外側から): http → CORS → security headers → 認証 → guard
 * - axum::serve() で起動 (Ctrl-C で graceful shutdown)
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::AppError;
use crate::repos::{InMemoryUserRepo, PgUserRepo, UserRepo};
use crate::services::auth::TokenCodec;
use crate::state::AppState;
use crate::{api, middleware};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,authgate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr can be hidden depending on how the process is launched.
        tracing::error!(?info, "panic");

        // Development: crash the whole process so it gets noticed.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let users = build_user_repo(&config).await?;
    tracing::info!(backend = users.backend_name(), "identity store ready");

    // Secret and TTL are fixed for the life of the process.
    let tokens = Arc::new(TokenCodec::new(
        config.jwt_secret.as_bytes(),
        config.jwt_ttl_seconds,
    ));
    let state = AppState::new(users, tokens, config.bcrypt_cost)
        .context("failed to prepare password verifier")?;

    let app = build_router(state, &config);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn build_user_repo(config: &Config) -> Result<Arc<dyn UserRepo>> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; users are kept in memory only");
        return Ok(Arc::new(InMemoryUserRepo::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("failed to connect to DATABASE_URL")?;

    let repo = PgUserRepo::new(pool);
    repo.ensure_schema()
        .await
        .context("failed to ensure users schema")?;

    Ok(Arc::new(repo))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let api = Router::new()
        .nest("/api/v1", api::v1::routes())
        .fallback(not_found);
    // every request passes the authenticator before any handler or guard
    let api = middleware::auth::authenticate::apply(api, state.clone());

    let router = api.with_state(state);
    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router, config)
}

async fn not_found() -> AppError {
    AppError::NotFound
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
