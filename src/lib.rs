pub mod api;
pub mod auth;
pub mod cli;
pub mod cors;
pub mod db;
pub mod jwt;
pub mod password;
pub mod rate_limit;

use api::create_api_router;
use axum::Router;
use axum::http::HeaderValue;
use db::Database;
use jwt::{TokenLifetimes, TokenService};
use rate_limit::RateLimitConfig;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Credential store (cloneable, uses connection pool internally)
    pub db: Database,
    /// Secret for signing and verifying both token kinds
    pub jwt_secret: Vec<u8>,
    /// Lifetimes for newly issued tokens
    pub token_lifetimes: TokenLifetimes,
    /// Whether to set Secure flag on the refresh cookie
    pub secure_cookies: bool,
    /// Credential requests allowed per client IP per minute (None disables limiting)
    pub login_rate_per_minute: Option<NonZeroU32>,
    /// Take the client IP from X-Forwarded-For (requires running behind a proxy)
    pub trust_forwarded_for: bool,
    /// Origins allowed to call the API with credentials (empty means same-origin only)
    pub cors_origins: Vec<HeaderValue>,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    build_app(config, rate_limit_config(config))
}

fn rate_limit_config(config: &ServerConfig) -> Option<Arc<RateLimitConfig>> {
    config.login_rate_per_minute.map(|per_minute| {
        Arc::new(RateLimitConfig::per_minute(
            per_minute,
            config.trust_forwarded_for,
        ))
    })
}

fn build_app(config: &ServerConfig, rate_limit: Option<Arc<RateLimitConfig>>) -> Router {
    let tokens = Arc::new(TokenService::with_lifetimes(
        &config.jwt_secret,
        config.token_lifetimes,
    ));

    let app = create_api_router(config.db.clone(), tokens, config.secure_cookies, rate_limit);

    match cors::cors_layer(&config.cors_origins) {
        Some(cors) => app.layer(cors),
        None => app,
    }
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let rate_limit = rate_limit_config(&config);
    if let Some(limits) = &rate_limit {
        rate_limit::spawn_cleanup_scheduler(limits.clone());
    }

    let app = build_app(&config, rate_limit);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
/// Note: For production use, prefer `run_server` directly in main.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> Result<(tokio::task::JoinHandle<()>, SocketAddr), std::io::Error> {
    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = run_server(config, listener).await {
            tracing::error!(error = %e, "Server error");
        }
    });

    Ok((handle, local_addr))
}
