mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{body_json, create_test_app};
use tower::ServiceExt;

async fn get(app: &axum::Router, uri: &str) -> axum::http::Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = create_test_app().await;

    let response = get(&app, "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "This is the health check for the server");
}

#[tokio::test]
async fn test_test_route() {
    let (app, _) = create_test_app().await;

    let response = get(&app, "/test").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Hi you have hit this route");
}

#[tokio::test]
async fn test_unknown_route() {
    let (app, _) = create_test_app().await;

    let response = get(&app, "/nope").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wrong_method_on_credential_route() {
    let (app, _) = create_test_app().await;

    let response = get(&app, "/login").await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_served_over_tcp() {
    let db = refreshgate::db::Database::open(":memory:").await.unwrap();
    let config = refreshgate::ServerConfig {
        db,
        jwt_secret: common::JWT_SECRET.to_vec(),
        token_lifetimes: Default::default(),
        secure_cookies: true,
        login_rate_per_minute: None,
        trust_forwarded_for: false,
        cors_origins: Vec::new(),
    };

    let (handle, addr) = refreshgate::start_server(config, 0).await.unwrap();
    assert_eq!(addr.ip().to_string(), "127.0.0.1");
    assert_ne!(addr.port(), 0);
    handle.abort();
}
