//! Forge console server.
//!
//! GitHub OAuth login with Redis-backed sessions.
//!
//! # Environment
//!
//! - `GITHUB_CLIENT_ID`, `GITHUB_CLIENT_SECRET`: OAuth app credentials
//! - `FORGE_JWT_SECRET`: login token signing key (≥ 32 bytes)
//! - `FORGE_SESSION_ENCRYPTION_KEY`: base64 AES-256 key for tokens at rest
//! - `FORGE_COOKIE_KEY`: base64 cookie signing key (≥ 64 bytes)
//! - `FORGE_BASE_URL`, `HOST`, `PORT`, `REDIS_URL`: see `ServerConfig`
//!
//! A `.env` file in the working directory is loaded first, if present.

use anyhow::Context;
use forge_auth::providers::{GitHubConfig, GitHubOAuthProvider, SubjectClaimsResolver};
use forge_auth::stores::RedisSessionStore;
use forge_auth::{AuthConfig, AuthEnvironment, Authenticator};
use forge_web::router::app_router;
use forge_web::{AppState, ServerConfig};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    let _ = dotenvy::dotenv();

    init_tracing();

    let server = ServerConfig::from_env()?;
    let auth_config = AuthConfig::from_env()?;
    let github = GitHubConfig::from_env()?;
    info!(
        bind_addr = %server.bind_addr,
        issuer = %auth_config.issuer,
        callback_url = %auth_config.callback_url(),
        "Starting Forge console"
    );

    let sessions = RedisSessionStore::new(&server.redis_url, server.session_encryption_key.clone())
        .await
        .context("connecting to Redis")?;
    info!("Redis session store connected");

    let claims = SubjectClaimsResolver::new(auth_config.issuer.clone());
    let env = AuthEnvironment::new(GitHubOAuthProvider::new(github), sessions, claims);
    let authenticator = Authenticator::new(auth_config, env)?;

    let app = app_router(AppState::new(authenticator, server.cookie_key()?));

    let listener = tokio::net::TcpListener::bind(server.bind_addr)
        .await
        .with_context(|| format!("binding {}", server.bind_addr))?;
    info!(bind_addr = %server.bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => error!("Unable to listen for shutdown signal: {err}"),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,forge_auth=debug,forge_web=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
