//! Tests for per-IP limiting of the credential routes.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{TestSetup, credentials, issued_pair, login, refresh, register};
use tower::ServiceExt;

#[tokio::test]
async fn test_login_rate_limited_after_quota() {
    let (app, _) = TestSetup::new().with_rate_limit(2).build().await;

    assert_eq!(login(&app, "alice", "pw1").await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(login(&app, "alice", "pw1").await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        login(&app, "alice", "pw1").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn test_register_and_login_share_quota() {
    let (app, _) = TestSetup::new().with_rate_limit(2).build().await;

    issued_pair(register(&app, "alice", "pw1").await).await;
    assert_eq!(login(&app, "alice", "pw1").await.status(), StatusCode::OK);
    assert_eq!(
        register(&app, "bob", "pw2").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn test_refresh_not_rate_limited() {
    let (app, _) = TestSetup::new().with_rate_limit(1).build().await;

    let mut current = issued_pair(register(&app, "alice", "pw1").await)
        .await
        .refresh_token;
    for _ in 0..3 {
        current = issued_pair(refresh(&app, &current).await).await.refresh_token;
    }
}

#[tokio::test]
async fn test_limits_are_per_ip() {
    let (app, _) = TestSetup::new().with_rate_limit(1).build().await;

    let from = |ip: &'static str| {
        Request::builder()
            .method("POST")
            .uri("/login")
            .header("content-type", "application/json")
            .header("x-forwarded-for", ip)
            .body(Body::from(credentials("alice", "pw1")))
            .unwrap()
    };

    let first = app.clone().oneshot(from("10.0.0.1")).await.unwrap();
    assert_eq!(first.status(), StatusCode::UNAUTHORIZED);
    let second = app.clone().oneshot(from("10.0.0.1")).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let other = app.clone().oneshot(from("10.0.0.2")).await.unwrap();
    assert_eq!(other.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_client_ip_is_forbidden() {
    let (app, _) = TestSetup::new().with_rate_limit(5).build().await;

    // No X-Forwarded-For and no connect info under oneshot
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header("content-type", "application/json")
                .body(Body::from(credentials("alice", "pw1")))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
