//! Authentication error types.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{debug, error};

use crate::jwt::TokenError;

/// Failure of an auth flow.
///
/// Token failures all collapse to the same `401` body, so the response never
/// says which check rejected the request.
#[derive(Debug)]
pub enum AuthError {
    BadRequest(&'static str),
    InvalidCredentials,
    IdentityExists,
    MissingToken,
    Unauthorized(TokenError),
    Internal,
}

impl AuthError {
    /// Log an infrastructure failure and return the generic internal error.
    pub fn internal(context: &str, e: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, e);
        Self::Internal
    }

    /// Map a token error, treating signing failures as internal.
    pub fn from_token(context: &str, e: TokenError) -> Self {
        if e.is_rejection() {
            Self::Unauthorized(e)
        } else {
            Self::internal(context, e)
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthError::IdentityExists => StatusCode::CONFLICT,
            AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            AuthError::BadRequest(msg) => msg,
            AuthError::InvalidCredentials => "Invalid username or password",
            AuthError::IdentityExists => "User already exists",
            AuthError::MissingToken | AuthError::Unauthorized(_) => "Unauthorized",
            AuthError::Internal => "Internal server error",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Unauthorized(e) => write!(f, "Unauthorized: {}", e),
            AuthError::MissingToken => write!(f, "Missing token"),
            other => f.write_str(other.message()),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection, "Rejected request body");
        Self::BadRequest("Invalid request body")
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}

/// Extension trait for concise error mapping on Results.
pub trait ResultExt<T> {
    fn internal_err(self, context: &str) -> Result<T, AuthError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn internal_err(self, context: &str) -> Result<T, AuthError> {
        self.map_err(|e| AuthError::internal(context, e))
    }
}
