//! Cross-origin access for browser clients served from other origins.
//!
//! The refresh token travels in a cookie, so credentials are allowed and the
//! allowed origins must be listed explicitly.

use axum::http::{HeaderValue, Method, header};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// How long browsers may cache a preflight response.
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Build the CORS layer for the given origins. No origins means same-origin only.
pub fn cors_layer(origins: &[HeaderValue]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins.iter().cloned()))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true)
            .max_age(PREFLIGHT_MAX_AGE),
    )
}

/// Parse an origin of the form `scheme://host[:port]`.
pub fn parse_origin(value: &str) -> Result<HeaderValue, String> {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .ok_or_else(|| format!("Origin must start with http:// or https://: {}", value))?;

    if rest.is_empty() || rest.contains('/') {
        return Err(format!("Origin must be scheme://host[:port]: {}", value));
    }

    HeaderValue::from_str(value).map_err(|e| format!("Invalid origin {}: {}", value, e))
}
