use axum::{Router, routing::get};

use super::auth::AuthState;
use crate::auth::Auth;

pub fn router(state: AuthState) -> Router {
    Router::new()
        .route("/protected", get(protected))
        .with_state(state)
}

async fn protected(Auth(user): Auth) -> String {
    format!("Hey {} - this is a protected route", user.identity)
}
