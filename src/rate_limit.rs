//! Rate limiting for credential endpoints.
//!
//! Uses a token bucket algorithm with per-IP tracking to slow down password guessing.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{num::NonZeroU32, sync::Arc, time::Duration};
use tracing::{debug, warn};

use crate::auth::extract_client_ip;

/// Interval between sweeps of idle client entries.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiting configuration for `/register` and `/login`.
pub struct RateLimitConfig {
    /// Shared per-IP limiter for both credential endpoints
    pub credentials: IpLimiter,
    /// Read the client IP from `X-Forwarded-For` instead of the socket
    pub trust_forwarded_for: bool,
}

impl RateLimitConfig {
    /// Allow `per_minute` credential requests per IP, all of which may arrive in a burst.
    pub fn per_minute(per_minute: NonZeroU32, trust_forwarded_for: bool) -> Self {
        Self {
            credentials: RateLimiter::keyed(Quota::per_minute(per_minute)),
            trust_forwarded_for,
        }
    }
}

/// Drop entries for clients whose bucket has fully refilled.
pub fn run_cleanup(config: &RateLimitConfig) {
    config.credentials.retain_recent();
    config.credentials.shrink_to_fit();
    debug!(
        tracked_ips = config.credentials.len(),
        "Rate limiter cleanup finished"
    );
}

/// Spawn a background task that sweeps the limiter periodically.
/// Returns a handle that can be used to abort the task.
pub fn spawn_cleanup_scheduler(config: Arc<RateLimitConfig>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

        loop {
            interval.tick().await;
            run_cleanup(&config);
        }
    })
}

/// Middleware for rate limiting credential endpoints.
pub async fn rate_limit_credentials(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = match extract_client_ip(&request, config.trust_forwarded_for) {
        Ok(ip) => ip,
        Err(e) => {
            warn!(reason = e, "Rejecting request without client IP");
            return (StatusCode::FORBIDDEN, "Unable to determine client IP.").into_response();
        }
    };

    match config.credentials.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            warn!(ip = %ip, "Credential rate limit exceeded");
            (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many authentication attempts. Please wait before trying again.",
            )
                .into_response()
        }
    }
}
