//! Registration, login, refresh and bearer authentication.
//!
//! Every flow short-circuits on its first failure and never returns tokens
//! whose refresh half was not stored.

use tracing::{info, warn};

use super::cookie::{CookieJar, REFRESH_COOKIE_NAME};
use super::errors::{AuthError, ResultExt};
use super::types::{AuthenticatedUser, Identity, IssuedTokens};
use crate::db::{Database, UserStore, is_unique_violation};
use crate::jwt::{IssuedToken, TokenError, TokenService};
use crate::password::{hash_password_blocking, verify_password_blocking};

/// Longest accepted username, in bytes.
pub const MAX_USERNAME_LEN: usize = 64;

/// Composes the token service with the credential store and password hasher.
pub struct AuthFlow<'a> {
    tokens: &'a TokenService,
    users: UserStore,
}

impl<'a> AuthFlow<'a> {
    pub fn new(tokens: &'a TokenService, db: &Database) -> Self {
        Self {
            tokens,
            users: db.users(),
        }
    }

    /// Create a credential record and sign the caller in.
    pub async fn register(&self, username: &str, password: &str) -> Result<IssuedTokens, AuthError> {
        validate_registration(username, password)?;

        let existing = self
            .users
            .get(username)
            .await
            .internal_err("Failed to look up user")?;
        if existing.is_some() {
            return Err(AuthError::IdentityExists);
        }

        let password_hash = hash_password_blocking(password.to_string())
            .await
            .internal_err("Failed to hash password")?;

        let identity = Identity::new(username);
        let (access, refresh) = self.issue_pair(&identity)?;

        if let Err(e) = self
            .users
            .create(username, &password_hash, &refresh.token)
            .await
        {
            // Lost a race with a concurrent registration
            if is_unique_violation(&e) {
                return Err(AuthError::IdentityExists);
            }
            return Err(AuthError::internal("Failed to create user", e));
        }

        info!(username = %identity, "User registered");
        Ok(self.tokens_for(identity, access, refresh))
    }

    /// Verify a password and rotate the stored refresh token.
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedTokens, AuthError> {
        // Unknown user and wrong password are indistinguishable to the caller
        let record = self
            .users
            .get(username)
            .await
            .internal_err("Failed to look up user")?
            .ok_or(AuthError::InvalidCredentials)?;

        let matches = verify_password_blocking(record.password_hash, password.to_string())
            .await
            .internal_err("Failed to verify password")?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let identity = Identity::new(record.username);
        let (access, refresh) = self.issue_pair(&identity)?;

        let updated = self
            .users
            .update_refresh_token(identity.as_str(), &refresh.token)
            .await
            .internal_err("Failed to store refresh token")?;
        if !updated {
            return Err(AuthError::internal(
                "Failed to store refresh token",
                "record vanished during login",
            ));
        }

        info!(username = %identity, "User logged in");
        Ok(self.tokens_for(identity, access, refresh))
    }

    /// Exchange the refresh token cookie for a new token pair.
    ///
    /// The presented token must equal the stored one, and the swap to the new
    /// value is conditional on that, so a token can be spent at most once.
    pub async fn refresh(&self, cookies: &CookieJar) -> Result<IssuedTokens, AuthError> {
        let presented = cookies
            .get(REFRESH_COOKIE_NAME)
            .ok_or(AuthError::MissingToken)?;

        let subject = self
            .tokens
            .refresh_token_subject(presented)
            .map_err(|e| AuthError::from_token("Failed to read refresh token", e))?;

        let record = self
            .users
            .get(subject.as_str())
            .await
            .internal_err("Failed to look up user")?
            .ok_or(AuthError::Unauthorized(TokenError::Revoked))?;

        let identity = self
            .tokens
            .validate_refresh_token(presented, &record.refresh_token)
            .map_err(|e| {
                if matches!(e, TokenError::Revoked) {
                    warn!(username = %subject, "Superseded refresh token presented");
                }
                AuthError::from_token("Failed to validate refresh token", e)
            })?;

        let (access, refresh) = self.issue_pair(&identity)?;

        let rotated = self
            .users
            .rotate_refresh_token(identity.as_str(), presented, &refresh.token)
            .await
            .internal_err("Failed to rotate refresh token")?;
        if !rotated {
            warn!(username = %identity, "Concurrent refresh lost the rotation");
            return Err(AuthError::Unauthorized(TokenError::Revoked));
        }

        info!(username = %identity, "Tokens refreshed");
        Ok(self.tokens_for(identity, access, refresh))
    }

    /// Validate a bearer access token.
    pub fn authenticate(&self, access_token: Option<&str>) -> Result<AuthenticatedUser, AuthError> {
        authenticate_access_token(self.tokens, access_token)
    }

    fn issue_pair(
        &self,
        identity: &Identity,
    ) -> Result<(IssuedToken, IssuedToken), AuthError> {
        let access = self
            .tokens
            .issue_access_token(identity)
            .map_err(|e| AuthError::internal("Failed to generate access token", e))?;
        let refresh = self
            .tokens
            .issue_refresh_token(identity)
            .map_err(|e| AuthError::internal("Failed to generate refresh token", e))?;
        Ok((access, refresh))
    }

    fn tokens_for(
        &self,
        identity: Identity,
        access: IssuedToken,
        refresh: IssuedToken,
    ) -> IssuedTokens {
        IssuedTokens {
            identity,
            access_token: access.token,
            refresh_token: refresh.token,
            refresh_max_age: refresh.duration,
        }
    }
}

/// Validate a bearer access token without touching the store.
pub fn authenticate_access_token(
    tokens: &TokenService,
    access_token: Option<&str>,
) -> Result<AuthenticatedUser, AuthError> {
    let token = access_token.ok_or(AuthError::MissingToken)?;

    let identity = tokens
        .validate_access_token(token)
        .map_err(|e| AuthError::from_token("Failed to validate access token", e))?;

    Ok(AuthenticatedUser { identity })
}

fn validate_registration(username: &str, password: &str) -> Result<(), AuthError> {
    if username.is_empty() {
        return Err(AuthError::BadRequest("Username cannot be empty"));
    }

    if username.len() > MAX_USERNAME_LEN {
        return Err(AuthError::BadRequest(
            "Username cannot be longer than 64 bytes",
        ));
    }

    if password.is_empty() {
        return Err(AuthError::BadRequest("Password cannot be empty"));
    }

    Ok(())
}
