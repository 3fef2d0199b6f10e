//! Signed access tokens (JWT, HS256).
//!
//! Tokens embed the owning user's id and an absolute expiration; verification
//! needs no store lookup. There is no revocation list (validity is purely
//! time- and signature-based).

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infra::config;

/// Claims embedded in every token issued by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Standard JWT subject: the user id, as a string.
    pub sub: String,
    /// Expiry (seconds since epoch).
    pub exp: i64,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
}

/// Issues and verifies access tokens with a single HMAC secret.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    default_expiry: Duration,
}

impl TokenService {
    pub fn new(secret: &str, expire_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            default_expiry: Duration::minutes(expire_minutes),
        }
    }

    /// Builds the service from `JWT_SECRET` / `JWT_EXPIRE_MINUTES`.
    pub fn from_env() -> Self {
        Self::new(&config::jwt_secret(), config::jwt_expire_minutes())
    }

    /// Signs a token for `sub`, expiring after `expires_in` (or the default
    /// window). Negative durations are allowed so tests can mint
    /// already-expired tokens.
    pub fn issue(&self, sub: &str, expires_in: Option<Duration>) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: sub.to_string(),
            exp: (now + expires_in.unwrap_or(self.default_expiry)).timestamp(),
            iat: now.timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Checks signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}
