#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Request, Response, StatusCode},
};
use refreshgate::{ServerConfig, create_app, db::Database, jwt::TokenLifetimes};
use std::num::NonZeroU32;
use tower::ServiceExt;

pub const JWT_SECRET: &[u8] = b"test-jwt-secret-for-testing";

/// Create a test app without rate limiting and return (app, db).
pub async fn create_test_app() -> (Router, Database) {
    TestSetup::new().build().await
}

/// Builder for test apps with various options
pub struct TestSetup {
    secure_cookies: bool,
    login_rate_per_minute: Option<NonZeroU32>,
    token_lifetimes: TokenLifetimes,
    cors_origins: Vec<HeaderValue>,
}

impl TestSetup {
    pub fn new() -> Self {
        Self {
            secure_cookies: true,
            login_rate_per_minute: None,
            token_lifetimes: TokenLifetimes::default(),
            cors_origins: Vec::new(),
        }
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    pub fn with_rate_limit(mut self, per_minute: u32) -> Self {
        self.login_rate_per_minute = NonZeroU32::new(per_minute);
        self
    }

    pub fn with_lifetimes(mut self, lifetimes: TokenLifetimes) -> Self {
        self.token_lifetimes = lifetimes;
        self
    }

    pub fn with_cors_origin(mut self, origin: &'static str) -> Self {
        self.cors_origins.push(HeaderValue::from_static(origin));
        self
    }

    pub async fn build(self) -> (Router, Database) {
        let db = Database::open(":memory:")
            .await
            .expect("Failed to open test database");
        let config = ServerConfig {
            db: db.clone(),
            jwt_secret: JWT_SECRET.to_vec(),
            token_lifetimes: self.token_lifetimes,
            secure_cookies: self.secure_cookies,
            login_rate_per_minute: self.login_rate_per_minute,
            trust_forwarded_for: true,
            cors_origins: self.cors_origins,
        };
        (create_app(&config), db)
    }
}

pub fn credentials(username: &str, password: &str) -> String {
    serde_json::json!({ "username": username, "password": password }).to_string()
}

pub async fn post_credentials(
    app: &Router,
    path: &str,
    username: &str,
    password: &str,
) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json")
                .header("x-forwarded-for", "127.0.0.1")
                .body(Body::from(credentials(username, password)))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn register(app: &Router, username: &str, password: &str) -> Response<Body> {
    post_credentials(app, "/register", username, password).await
}

pub async fn login(app: &Router, username: &str, password: &str) -> Response<Body> {
    post_credentials(app, "/login", username, password).await
}

pub async fn refresh(app: &Router, refresh_token: &str) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/refresh")
                .header("cookie", format!("refresh_token={}", refresh_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn get_protected(app: &Router, access_token: &str) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/protected")
                .header("authorization", format!("Bearer {}", access_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Tokens from a successful register/login/refresh response.
pub struct IssuedPair {
    pub access_token: String,
    pub refresh_token: String,
    pub set_cookie: String,
}

/// Read the access token body and the refresh cookie out of a 200 response.
pub async fn issued_pair(response: Response<Body>) -> IssuedPair {
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = extract_set_cookies(&response)
        .into_iter()
        .find(|c| c.starts_with("refresh_token="))
        .expect("No refresh_token cookie set");
    let refresh_token = set_cookie
        .trim_start_matches("refresh_token=")
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let json = body_json(response).await;
    let access_token = json["access_token"]
        .as_str()
        .expect("No access_token in body")
        .to_string();

    IssuedPair {
        access_token,
        refresh_token,
        set_cookie,
    }
}

/// Extract Set-Cookie headers from response
pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}
