//! JWT token issuing and validation.
//!
//! Access tokens are stateless. Refresh tokens are only accepted when they
//! match the value currently stored for their subject, which is what makes
//! rotation effective without a revocation list.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::Identity;

/// Token type for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived bearer token, never persisted
    Access,
    /// Long-lived token, bound to the credential record
    Refresh,
}

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (username)
    pub sub: String,
    /// Token type
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// JWT claims for refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Random per-token ID, keeps two tokens minted in the same second distinct
    pub jti: String,
    /// Subject (username)
    pub sub: String,
    /// Token type
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Access token duration: 15 minutes
pub const ACCESS_TOKEN_DURATION_SECS: u64 = 15 * 60;

/// Refresh token duration: 30 days
pub const REFRESH_TOKEN_DURATION_SECS: u64 = 30 * 24 * 60 * 60;

/// Lifetimes applied to newly issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access_secs: u64,
    pub refresh_secs: u64,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access_secs: ACCESS_TOKEN_DURATION_SECS,
            refresh_secs: REFRESH_TOKEN_DURATION_SECS,
        }
    }
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The JWT token string
    pub token: String,
    /// Issued at timestamp (Unix seconds)
    pub issued_at: u64,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
    /// Token duration in seconds
    pub duration: u64,
}

/// Signs and verifies access and refresh tokens with a single HMAC key.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetimes: TokenLifetimes,
}

impl TokenService {
    /// Create a token service with the default lifetimes.
    pub fn new(secret: &[u8]) -> Self {
        Self::with_lifetimes(secret, TokenLifetimes::default())
    }

    pub fn with_lifetimes(secret: &[u8], lifetimes: TokenLifetimes) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetimes,
        }
    }

    /// Issue a short-lived access token for `identity`.
    pub fn issue_access_token(&self, identity: &Identity) -> Result<IssuedToken, TokenError> {
        let now = unix_now()?;
        let exp = now + self.lifetimes.access_secs;

        let claims = AccessClaims {
            sub: identity.as_str().to_string(),
            token_type: TokenType::Access,
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(TokenError::Encoding)?;

        Ok(IssuedToken {
            token,
            issued_at: now,
            expires_at: exp,
            duration: self.lifetimes.access_secs,
        })
    }

    /// Issue a long-lived refresh token for `identity`.
    /// Nothing is persisted here; the caller stores the value.
    pub fn issue_refresh_token(&self, identity: &Identity) -> Result<IssuedToken, TokenError> {
        let now = unix_now()?;
        let exp = now + self.lifetimes.refresh_secs;

        let claims = RefreshClaims {
            jti: uuid::Uuid::new_v4().to_string(),
            sub: identity.as_str().to_string(),
            token_type: TokenType::Refresh,
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(TokenError::Encoding)?;

        Ok(IssuedToken {
            token,
            issued_at: now,
            expires_at: exp,
            duration: self.lifetimes.refresh_secs,
        })
    }

    /// Validate an access token and return the identity it was issued to.
    pub fn validate_access_token(&self, token: &str) -> Result<Identity, TokenError> {
        self.decode_access_claims(token)
            .map(|claims| Identity::new(claims.sub))
    }

    fn decode_access_claims(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims: AccessClaims = self.decode(token)?;

        if claims.token_type != TokenType::Access {
            return Err(TokenError::Invalid);
        }

        Ok(claims)
    }

    /// Verify signature, expiry and type of a refresh token and return its subject.
    ///
    /// This does not check the token against the stored value, so a successful
    /// result only says which record to look up.
    pub fn refresh_token_subject(&self, token: &str) -> Result<Identity, TokenError> {
        self.decode_refresh_claims(token)
            .map(|claims| Identity::new(claims.sub))
    }

    /// Validate a refresh token against the value currently stored for its subject.
    pub fn validate_refresh_token(
        &self,
        token: &str,
        stored_token: &str,
    ) -> Result<Identity, TokenError> {
        let claims = self.decode_refresh_claims(token)?;

        if token != stored_token {
            return Err(TokenError::Revoked);
        }

        Ok(Identity::new(claims.sub))
    }

    fn decode_refresh_claims(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let claims: RefreshClaims = self.decode(token)?;

        if claims.token_type != TokenType::Refresh {
            return Err(TokenError::Invalid);
        }

        Ok(claims)
    }

    fn decode<T: serde::de::DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        jsonwebtoken::decode::<T>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::from_decoding)
    }
}

fn unix_now() -> Result<u64, TokenError> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| TokenError::TimeError)?
        .as_secs())
}

/// Errors that can occur during token operations.
#[derive(Debug)]
pub enum TokenError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Bad signature, garbled token, or wrong token type
    Invalid,
    /// Past its `exp`
    Expired,
    /// Well-formed but no longer the stored refresh token
    Revoked,
    /// Subject or expiry claim missing or of the wrong type
    MalformedClaims,
    /// System time error
    TimeError,
}

impl TokenError {
    fn from_decoding(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::MissingRequiredClaim(_) | ErrorKind::Json(_) => TokenError::MalformedClaims,
            _ => TokenError::Invalid,
        }
    }

    /// Whether this is a validation failure rather than an infrastructure one.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, TokenError::Encoding(_) | TokenError::TimeError)
    }
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            TokenError::Invalid => write!(f, "Invalid token"),
            TokenError::Expired => write!(f, "Token expired"),
            TokenError::Revoked => write!(f, "Token has been rotated out"),
            TokenError::MalformedClaims => write!(f, "Malformed token claims"),
            TokenError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for TokenError {}
