// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use authgate_common::{ErrorResponse, FieldError};
use thiserror::Error;

use crate::auth::{AuthError, TokenError};
use crate::storage::StoreError;

/// Message returned for both unknown email and wrong password
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Application error types, each mapped to one HTTP status
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Email already exists")]
    Conflict,

    #[error("Invalid credentials")]
    Unauthorized,

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Token(_) | AppError::Store(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Body sent to the client. Internal causes never leave the process.
    pub fn to_body(&self) -> ErrorResponse {
        match self {
            AppError::Validation(details) => {
                ErrorResponse::new("Validation failed").with_details(details.clone())
            }
            AppError::Conflict => ErrorResponse::new("Email already exists"),
            AppError::Unauthorized => ErrorResponse::new(INVALID_CREDENTIALS),
            AppError::Token(_) | AppError::Store(_) | AppError::Internal(_) => {
                ErrorResponse::new("Internal server error")
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailConflict => AppError::Conflict,
            AuthError::NotFound | AuthError::InvalidCredentials => AppError::Unauthorized,
            AuthError::Store(e) => AppError::Store(e),
            AuthError::Hashing(msg) => AppError::Internal(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (status, Json(self.to_body())).into_response()
    }
}
