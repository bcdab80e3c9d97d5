use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;

/// Default lifetime of an access token.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
/// Default lifetime of a refresh token.
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Why a token could not be issued or accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Malformed token or bad signature.
    Invalid(String),
    /// The token is past its `exp`.
    Expired,
    /// An access token was presented where a refresh token was expected, or vice versa.
    WrongType,
    /// Encoding failed while issuing a token.
    Signing(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenError::Invalid(msg) => write!(f, "Invalid token: {}", msg),
            TokenError::Expired => write!(f, "Invalid token: expired"),
            TokenError::WrongType => write!(f, "Invalid token: wrong token type"),
            TokenError::Signing(msg) => write!(f, "Failed to sign token: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the username.
    pub sub: String,
    /// Unique per issuance, so two tokens minted in the same second never collide.
    pub jti: String,
    pub typ: TokenType,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// The pair handed out on login and on every refresh.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Identity carried by a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    pub username: String,
}

/// Identity carried by a verified refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshClaims {
    pub username: String,
    pub jti: String,
}

/// Issues and verifies HS256 tokens.
///
/// Access and refresh tokens may be signed with different secrets. Expiry is
/// checked against the injected [`Clock`] rather than the system time, and the
/// service never touches storage.
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(access_secret: &str, refresh_secret: &str, clock: Arc<dyn Clock>) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl: Duration::seconds(ACCESS_TOKEN_TTL_SECS),
            refresh_ttl: Duration::seconds(REFRESH_TOKEN_TTL_SECS),
            clock,
        }
    }

    /// Overrides the default 15 minute / 7 day lifetimes.
    pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    pub fn issue_pair(&self, username: &str) -> Result<TokenPair, TokenError> {
        let access_token = self.sign(username, TokenType::Access)?;
        let refresh_token = self.sign(username, TokenType::Refresh)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims = self.decode_checked(token, TokenType::Access)?;
        Ok(AccessClaims {
            username: claims.sub,
        })
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let claims = self.decode_checked(token, TokenType::Refresh)?;
        Ok(RefreshClaims {
            username: claims.sub,
            jti: claims.jti,
        })
    }

    fn sign(&self, username: &str, typ: TokenType) -> Result<String, TokenError> {
        let now = self.clock.now();
        let (ttl, key) = match typ {
            TokenType::Access => (self.access_ttl, &self.access_encoding),
            TokenType::Refresh => (self.refresh_ttl, &self.refresh_encoding),
        };

        let claims = Claims {
            sub: username.to_string(),
            jti: Uuid::new_v4().to_string(),
            typ,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn decode_checked(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let key = match expected {
            TokenType::Access => &self.access_decoding,
            TokenType::Refresh => &self.refresh_decoding,
        };

        // Expiry is checked below against the injected clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        if claims.typ != expected {
            return Err(TokenError::WrongType);
        }
        if claims.exp <= self.clock.now().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}
