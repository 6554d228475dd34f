//! Credential and token endpoints.
//!
//! - POST `/register` - Create a user, returns a token pair
//! - POST `/login` - Check a password, returns a token pair
//! - POST `/refresh` - Spend the refresh token cookie for a new token pair

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header::SET_COOKIE},
    middleware,
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{AuthError, AuthFlow, CookieJar, IssuedTokens, refresh_cookie};
use crate::db::Database;
use crate::impl_has_auth_backend;
use crate::jwt::TokenService;
use crate::rate_limit::{RateLimitConfig, rate_limit_credentials};

#[derive(Clone)]
pub struct AuthState {
    pub db: Database,
    pub tokens: Arc<TokenService>,
    pub secure_cookies: bool,
}

impl_has_auth_backend!(AuthState);

impl AuthState {
    fn flow(&self) -> AuthFlow<'_> {
        AuthFlow::new(&self.tokens, &self.db)
    }
}

pub fn router(state: AuthState, rate_limit: Option<Arc<RateLimitConfig>>) -> Router {
    let credentials = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .with_state(state.clone());

    let credentials = match rate_limit {
        Some(config) => {
            credentials.layer(middleware::from_fn_with_state(config, rate_limit_credentials))
        }
        None => credentials,
    };

    Router::new()
        .route("/refresh", post(refresh))
        .with_state(state)
        .merge(credentials)
}

#[derive(Deserialize)]
struct CredentialsRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct TokenResponse {
    access_token: String,
}

/// Access token in the body, refresh token in the cookie.
fn token_response(issued: IssuedTokens, secure_cookies: bool) -> impl IntoResponse {
    let cookie = refresh_cookie(
        &issued.refresh_token,
        issued.refresh_max_age,
        secure_cookies,
    );

    (
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(TokenResponse {
            access_token: issued.access_token,
        }),
    )
}

async fn register(
    State(state): State<AuthState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    let Json(payload) = payload?;
    let issued = state
        .flow()
        .register(&payload.username, &payload.password)
        .await?;
    Ok(token_response(issued, state.secure_cookies))
}

async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    let Json(payload) = payload?;
    let issued = state
        .flow()
        .login(&payload.username, &payload.password)
        .await?;
    Ok(token_response(issued, state.secure_cookies))
}

async fn refresh(
    State(state): State<AuthState>,
    cookies: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    let issued = state.flow().refresh(&cookies).await?;
    Ok(token_response(issued, state.secure_cookies))
}
