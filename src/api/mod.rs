mod auth;
mod health;
mod protected;

use axum::Router;
use std::sync::Arc;

use crate::db::Database;
use crate::jwt::TokenService;
use crate::rate_limit::RateLimitConfig;

pub use auth::AuthState;

/// Create the API router.
pub fn create_api_router(
    db: Database,
    tokens: Arc<TokenService>,
    secure_cookies: bool,
    rate_limit: Option<Arc<RateLimitConfig>>,
) -> Router {
    let auth_state = AuthState {
        db,
        tokens,
        secure_cookies,
    };

    Router::new()
        .merge(health::router())
        .merge(auth::router(auth_state.clone(), rate_limit))
        .merge(protected::router(auth_state))
}
