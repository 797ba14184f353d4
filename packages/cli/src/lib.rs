// ABOUTME: Porchlight server assembly: configuration, middleware stack and startup
// ABOUTME: Composes the public, admin and redirect routers into one axum application

pub mod config;
pub mod middleware;

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    Router,
};
use porchlight_api::AppState;
use porchlight_integrations::Integrations;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

pub use config::{Config, ConfigError};
use middleware::{
    admin_token_middleware, create_panic_handler, rate_limit_middleware, AdminAuth,
    RateLimitLayer, SecurityHeadersLayer,
};

/// Largest accepted request body; form and admin payloads are small JSON
pub const MAX_BODY_BYTES: usize = 64 * 1024;

const LIMITER_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Build the full application with every middleware layer applied
pub fn build_router(state: AppState, config: &Config) -> anyhow::Result<Router> {
    build_router_with_limiter(state, config, RateLimitLayer::new(config.rate_limit.clone()))
}

fn build_router_with_limiter(
    state: AppState,
    config: &Config,
    limiter: RateLimitLayer,
) -> anyhow::Result<Router> {
    let admin_auth = AdminAuth::new(config.admin_token.as_deref(), config.dev_mode);
    if config.dev_mode {
        warn!("Development mode: admin endpoints are not authenticated");
    }

    let admin = porchlight_api::create_admin_router()
        .layer(from_fn_with_state(admin_auth, admin_token_middleware));

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS_ORIGIN '{}'", config.cors_origin))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-admin-token"),
        ]);

    let mut security_headers = SecurityHeadersLayer::new();
    if config.enable_hsts {
        security_headers = security_headers.with_hsts();
    }

    Ok(Router::new()
        .nest("/api", porchlight_api::create_public_router())
        .nest("/api/admin", admin)
        .merge(porchlight_api::create_redirect_router())
        .with_state(state)
        .layer(from_fn_with_state(limiter, rate_limit_middleware))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(security_headers)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(create_panic_handler()))
}

/// Open the database, wire the integrations and serve until ctrl-c
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let pool = porchlight_storage::connect(&config.database_path)
        .await
        .with_context(|| {
            format!(
                "Failed to open database at {}",
                config.database_path.display()
            )
        })?;

    let integrations = Integrations::from_config(&config.integrations)
        .context("Failed to initialise integrations")?;

    let state = AppState::new(pool, integrations, config.public_base_url.clone());
    let limiter = RateLimitLayer::new(config.rate_limit.clone());
    spawn_limiter_cleanup(limiter.clone());

    let app = build_router_with_limiter(state, &config, limiter)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        "Porchlight API listening on {} (database: {})",
        addr,
        config.database_path.display()
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

fn spawn_limiter_cleanup(limiter: RateLimitLayer) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LIMITER_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            limiter.retain_recent();
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
