//! Unauthenticated liveness endpoints.

use axum::{Json, Router, routing::get};
use serde::Serialize;

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/test", get(test_route))
}

async fn health_check() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "This is the health check for the server",
    })
}

async fn test_route() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hi you have hit this route",
    })
}
