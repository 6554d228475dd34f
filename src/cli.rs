//! CLI argument parsing, validation, and startup helpers.

use std::num::NonZeroU32;

use crate::ServerConfig;
use crate::cors::parse_origin;
use crate::db::Database;
use crate::jwt::{ACCESS_TOKEN_DURATION_SECS, REFRESH_TOKEN_DURATION_SECS, TokenLifetimes};
use axum::http::HeaderValue;
use clap::Parser;
use tracing::{error, info};

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "refreshgate",
    about = "Access and rotating refresh tokens for a username/password directory"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "refreshgate.db")]
    pub database: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, default_value_t = ACCESS_TOKEN_DURATION_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub access_token_ttl: u64,

    /// Omit the Secure flag on the refresh cookie (plain HTTP development only)
    #[arg(long)]
    pub insecure_cookies: bool,

    /// Register/login requests allowed per client IP per minute, 0 disables limiting
    #[arg(long, default_value = "10")]
    pub login_rate_per_minute: u32,

    /// Take the client IP from X-Forwarded-For (only behind a trusted proxy)
    #[arg(long)]
    pub trust_forwarded_for: bool,

    /// Browser origin allowed to call the API with credentials (repeatable)
    #[arg(long = "cors-origin", value_parser = parse_origin)]
    pub cors_origins: Vec<HeaderValue>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    if !is_valid_secret(&secret) {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

fn is_valid_secret(secret: &str) -> bool {
    secret.len() >= MIN_JWT_SECRET_LENGTH
}

/// Build ServerConfig from validated arguments.
pub fn build_config(args: &Args, db: Database, jwt_secret: String) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        token_lifetimes: TokenLifetimes {
            access_secs: args.access_token_ttl,
            refresh_secs: REFRESH_TOKEN_DURATION_SECS,
        },
        secure_cookies: !args.insecure_cookies,
        login_rate_per_minute: NonZeroU32::new(args.login_rate_per_minute),
        trust_forwarded_for: args.trust_forwarded_for,
        cors_origins: args.cors_origins.clone(),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
