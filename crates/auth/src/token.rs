//! Bearer token verification and issuance (HS256).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use bookshelf_core::UserId;

use crate::claims::{JwtClaims, validate_claims};

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The header was not of the form `Bearer <token>`.
    #[error("no bearer token")]
    MissingToken,

    /// Signature, format, or time-window validation failed.
    #[error("invalid token: {0}")]
    InvalidToken(String),
}

/// Extract the token from an `Authorization` header value.
///
/// The scheme must be exactly `Bearer` followed by a single space; anything else
/// (other schemes, lowercase `bearer`, an empty token) is treated as "no token".
pub fn parse_bearer(raw_header: &str) -> Result<&str, TokenError> {
    let token = raw_header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(TokenError::MissingToken)?
        .trim();

    if token.is_empty() {
        return Err(TokenError::MissingToken);
    }

    Ok(token)
}

/// Validates bearer credentials and resolves them to claims.
///
/// Implementations are pure: no IO, no side effects.
pub trait TokenVerifier: Send + Sync {
    /// Verify a bare token string (without the `Bearer ` scheme).
    fn verify_token(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError>;

    /// Verify a raw `Authorization` header value.
    fn verify(&self, raw_header: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let token = parse_bearer(raw_header)?;
        self.verify_token(token, now)
    }
}

/// HMAC-SHA256 verifier keyed by the process signing secret.
#[derive(Clone)]
pub struct Hs256TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256TokenVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `validate_claims` against the caller's clock.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }
}

impl core::fmt::Debug for Hs256TokenVerifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenVerifier").finish_non_exhaustive()
    }
}

impl TokenVerifier for Hs256TokenVerifier {
    fn verify_token(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| TokenError::InvalidToken(e.to_string()))?;

        validate_claims(&data.claims, now).map_err(|e| TokenError::InvalidToken(e.to_string()))?;

        Ok(data.claims)
    }
}

/// Mints HS256 tokens for a subject.
///
/// Credential issuance is not exposed over HTTP; this exists for tooling and tests.
#[derive(Clone)]
pub struct Hs256TokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl Hs256TokenIssuer {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_ref()),
            ttl,
        }
    }

    pub fn issue(&self, sub: UserId, now: DateTime<Utc>) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = JwtClaims::new(sub, now, now + self.ttl);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.key)
    }
}
