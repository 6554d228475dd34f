//! Authentication identity types.

use std::fmt;

/// A username, the sole subject carried by every token.
///
/// Compared byte for byte; no trimming or case folding happens anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn new(username: impl Into<String>) -> Self {
        Self(username.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request-scoped caller identity, produced from a validated access token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub identity: Identity,
}

/// Tokens handed back by a successful register, login or refresh.
///
/// Only constructed after the refresh token has been durably stored.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub identity: Identity,
    pub access_token: String,
    pub refresh_token: String,
    /// Refresh cookie lifetime in seconds
    pub refresh_max_age: u64,
}
