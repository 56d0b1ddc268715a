//! Auth gate for protected routes.
//!
//! Each request gets exactly one [`Admission`]: either it proceeds with an
//! attached [`AuthenticatedUser`], or it is rejected with a terminal response
//! and the downstream handler never runs.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use bookshelf_auth::{TokenError, TokenVerifier};
use bookshelf_infra::UserStore;

use crate::app::errors::{self, ApiError};
use crate::context::AuthenticatedUser;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
    pub users: Arc<dyn UserStore>,
}

/// Outcome of the auth gate.
#[derive(Debug)]
pub enum Admission {
    Proceed(AuthenticatedUser),
    Reject(ApiError),
}

/// Decide whether a request carrying `authorization` may proceed.
///
/// The user store is only consulted once the token has verified.
pub async fn admit(auth: &AuthState, authorization: Option<&HeaderValue>, now: DateTime<Utc>) -> Admission {
    let Some(raw) = authorization else {
        tracing::debug!("rejected: no authorization header");
        return Admission::Reject(ApiError::unauthorized(errors::NO_TOKEN));
    };

    let Ok(raw) = raw.to_str() else {
        tracing::debug!("rejected: authorization header is not visible ASCII");
        return Admission::Reject(ApiError::unauthorized(errors::NO_TOKEN));
    };

    let claims = match auth.verifier.verify(raw, now) {
        Ok(claims) => claims,
        Err(TokenError::MissingToken) => {
            tracing::debug!("rejected: authorization header is not a bearer token");
            return Admission::Reject(ApiError::unauthorized(errors::NO_TOKEN));
        }
        Err(TokenError::InvalidToken(reason)) => {
            tracing::warn!(%reason, "rejected: token verification failed");
            return Admission::Reject(ApiError::unauthorized(errors::TOKEN_FAILED));
        }
    };

    match auth.users.find_public(claims.sub).await {
        Ok(Some(user)) => Admission::Proceed(AuthenticatedUser::new(user)),
        Ok(None) => {
            tracing::warn!(user_id = %claims.sub, "rejected: token subject has no user record");
            Admission::Reject(ApiError::unauthorized(errors::USER_NOT_FOUND))
        }
        Err(e) => Admission::Reject(ApiError::from(e)),
    }
}

pub async fn auth_middleware(State(auth): State<AuthState>, mut req: Request, next: Next) -> Response {
    let authorization = req.headers().get(header::AUTHORIZATION).cloned();
    let admission = admit(&auth, authorization.as_ref(), Utc::now()).await;

    match admission {
        Admission::Proceed(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Admission::Reject(err) => err.into_response(),
    }
}
