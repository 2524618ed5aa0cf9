//! Bearer-token mint and verification.
//!
//! Tokens are HS256 JWTs carrying only the user id and the standard
//! issued-at/expiry claims. Everything else about the user is loaded fresh
//! from the database on every request, so role or active-flag changes take
//! effect immediately.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i32,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Expiry (seconds since epoch).
    pub exp: i64,
}

pub fn issue_token(user_id: i32, config: &AppConfig) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp(),
        exp: (now + Duration::hours(config.token_ttl_hours)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        error!("failed to sign token: {}", e);
        ApiError::Internal("failed to sign token".to_string())
    })
}

/// Verifies signature and expiry. Every failure mode collapses to
/// `Unauthorized`; callers never learn whether the token was malformed,
/// forged, or merely stale.
pub fn verify_token(token: &str, config: &AppConfig) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))
}
