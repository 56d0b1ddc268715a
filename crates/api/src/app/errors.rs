//! Consistent JSON error responses.
//!
//! Every error body is `{"error": <code>, "message": <text>}`. Internal errors
//! are logged here and never expose storage details to the client.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use bookshelf_auth::AccessDenied;
use bookshelf_books::BookValidationError;
use bookshelf_infra::StoreError;

pub const NO_TOKEN: &str = "Not authorized, no token";
pub const TOKEN_FAILED: &str = "Not authorized, token failed";
pub const USER_NOT_FOUND: &str = "Not authorized, user not found";
pub const MISSING_FIELDS: &str = "Please add all required fields";
pub const BOOK_NOT_FOUND: &str = "Book not found";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn book_not_found() -> Self {
        Self::NotFound(BOOK_NOT_FOUND.to_string())
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::Unauthorized(message.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::NotFound(_) => "not_found",
            ApiError::Internal(_) => "server_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::BadRequest(m) | ApiError::Unauthorized(m) | ApiError::NotFound(m) => m.clone(),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                "Server error".to_string()
            }
        };
        json_error(self.status(), self.code(), message)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<BookValidationError> for ApiError {
    fn from(err: BookValidationError) -> Self {
        tracing::debug!(error = %err, "rejected book");
        ApiError::BadRequest(MISSING_FIELDS.to_string())
    }
}

impl From<AccessDenied> for ApiError {
    fn from(denied: AccessDenied) -> Self {
        ApiError::Unauthorized(format!("Not authorized to {} this book", denied.action))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
