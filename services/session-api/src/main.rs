//! Tessera Session API
//!
//! Demo service: logs users in with a fixed account list and protects the
//! routes under the configured auth paths with session tokens.

mod config;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tessera_axum::SessionRoutes;
use tessera_core::TokenManager;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::handlers::StaticAuthenticator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Tessera Session API");

    let config = Config::from_env()?;
    let manager = TokenManager::connect(config.tokens.clone()).await?;

    let protected = Router::new().route("/api/me", get(handlers::me));

    let mut routes = SessionRoutes::new(config.mode)
        .with_auth_paths(config.auth_paths.clone())
        .with_login_path(config.login_path.clone())
        .with_logout_path(config.logout_path.clone())
        .with_session_path("/session");
    if let Some(prefix) = &config.group_prefix {
        routes = routes.with_group_prefix(prefix.clone());
    }

    let authenticator = Arc::new(StaticAuthenticator::new(config.users.clone()));
    let app = routes
        .mount(protected, manager, authenticator)?
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
