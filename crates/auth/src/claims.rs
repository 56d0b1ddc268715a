use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bookshelf_core::UserId;

/// JWT claims model (transport-agnostic).
///
/// This is the minimal set of claims the service expects once a token has been
/// decoded and its signature verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Issued-at timestamp (seconds since the Unix epoch).
    pub iat: i64,

    /// Expiration timestamp (seconds since the Unix epoch).
    pub exp: i64,
}

impl JwtClaims {
    pub fn new(sub: UserId, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.iat, 0).single()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Tolerated clock skew between the issuer and this service, in seconds.
///
/// Applies to `iat` only; expiry is exact.
pub const ISSUED_AT_LEEWAY_SECS: i64 = 60;

/// Deterministically validate JWT claims.
///
/// Note: this validates the *claims* only. Signature verification happens in
/// [`crate::token`].
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let (Some(issued_at), Some(expires_at)) = (claims.issued_at(), claims.expires_at()) else {
        return Err(TokenValidationError::InvalidTimeWindow);
    };

    if expires_at <= issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now + Duration::seconds(ISSUED_AT_LEEWAY_SECS) < issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
