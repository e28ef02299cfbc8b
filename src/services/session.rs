//! Signed, self-contained session tokens.
//!
//! A token is a claim bundle (identity, role, avatar) with a fixed expiry
//! horizon, verified statelessly per request. There is no refresh: once
//! expired, the client logs in again.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Role, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i32,

    pub username: String,

    pub role: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    /// Expiry, seconds since the epoch.
    pub exp: usize,
}

impl Claims {
    #[must_use]
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_default()
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Token is invalid or expired")]
    Invalid,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Keypair derived from the configured signing secret.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_days: i64,
}

impl SessionKeys {
    #[must_use]
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_days,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, SessionError> {
        let exp = chrono::Utc::now() + chrono::Duration::days(self.ttl_days);

        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
            avatar: user.avatar.clone(),
            exp: usize::try_from(exp.timestamp()).unwrap_or(usize::MAX),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| SessionError::Signing(e.to_string()))
    }

    /// Verify signature and expiry; any failure collapses to
    /// [`SessionError::Invalid`] so callers cannot distinguish a forged
    /// token from a stale one.
    pub fn verify(&self, token: &str) -> Result<Claims, SessionError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| SessionError::Invalid)
    }
}
