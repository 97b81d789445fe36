//! Formativa - Training Management System API
//! Mission: Track training programs for an economic-development NGO

use anyhow::{Context, Result};
use axum::middleware as axum_middleware;
use dotenv::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use formativa_backend::{
    api::{build_router, AppState},
    audit::AuditStore,
    auth::{JwtHandler, UserStore},
    config::Config,
    middleware::{rate_limit_middleware, request_logging, RateLimiter},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    info!("🚀 Formativa API starting");

    let config = Config::from_env();

    let users = Arc::new(UserStore::new(&config.db_path).context("Failed to open user store")?);
    let audit = Arc::new(AuditStore::new(&config.db_path).context("Failed to open audit store")?);
    let tokens = Arc::new(JwtHandler::new(
        config.jwt_secret.clone(),
        config.jwt_expiry_days,
    ));

    info!("📊 Database initialized at: {}", config.db_path);

    let state = AppState {
        users,
        audit,
        tokens,
    };

    let limiter = RateLimiter::new(config.rate_limit.clone());

    // Sweep stale rate-limit windows in the background
    let cleanup_limiter = limiter.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(300)).await;
            cleanup_limiter.cleanup();
        }
    });

    let app = build_router(state)
        .layer(axum_middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ))
        .layer(axum_middleware::from_fn(request_logging));

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("🎯 API server listening on {}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

/// Initialize tracing with env-filter support.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formativa_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
