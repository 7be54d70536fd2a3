/*
 * Responsibility
 * - tracing / panic hook 初期化
 * - Config読み込み → 依存生成 (PgPool, TokenStore, Resolver/Issuer) → Router 組み立て
 * - Middleware の適用 (CORS / request-id / trace / limit / timeout)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::Config;
use crate::middleware;
use crate::repos::{PgTokenStore, PgUserRepository};
use crate::services::auth::store::TokenStore;
use crate::services::auth::{AuthenticationResolver, TokenHasher, TokenIssuer, password, sweeper};
use crate::state::{AppState, CookieSettings};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,storage_gateway=debug,tower_http=debug cargo run
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
        // Always surface panics via tracing; stderr may not be collected.
        tracing::error!(?info, "panic");

        // Development: crash the whole process so we notice immediately.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("loading configuration")?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    // Fail fast: a broken digest must never reach request handling.
    let hasher = TokenHasher::new().context("token hasher self-test")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("connecting to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("running migrations")?;

    let idle_timeout = config
        .token_idle_timeout
        .map(chrono::Duration::from_std)
        .transpose()
        .context("TOKEN_IDLE_TIMEOUT_SECONDS out of range")?;

    let tokens: Arc<dyn TokenStore> = Arc::new(PgTokenStore::new(pool.clone(), idle_timeout));
    if idle_timeout.is_some() {
        sweeper::spawn(tokens.clone(), config.token_purge_interval);
    }

    // Unknown-email logins must not pay for building this on first use.
    let dummy_ready = tokio::task::spawn_blocking(password::prepare_dummy_hash)
        .await
        .context("preparing dummy password hash")?;
    if !dummy_ready {
        anyhow::bail!("dummy password hash unavailable");
    }

    let users = Arc::new(PgUserRepository::new(pool));

    Ok(AppState::new(
        AuthenticationResolver::new(hasher, tokens.clone()),
        TokenIssuer::new(hasher, tokens),
        users,
        CookieSettings {
            name: config.auth_cookie_name.clone(),
            secure: config.app_env.is_production(),
        },
    ))
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router, config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
