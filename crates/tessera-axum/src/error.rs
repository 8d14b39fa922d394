//! Error types for the auth middleware, extractors and session endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tessera_core::TokenError;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// Authentication errors at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No token in header, query or form body.
    #[error("missing token")]
    MissingToken,

    /// `Authorization` header present but not `Bearer <token>`.
    #[error("malformed authorization header")]
    InvalidAuthorization,

    /// Request body could not be read for the token lookup.
    #[error("request body rejected: {0}")]
    Body(String),

    /// Handler expected an auth context the middleware did not provide.
    #[error("authentication required")]
    Unauthenticated,

    /// Login credentials were rejected.
    #[error("login failed")]
    LoginRejected,

    /// Token engine error.
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::Body(_) => StatusCode::BAD_REQUEST,
            Self::InvalidAuthorization | Self::Unauthenticated | Self::LoginRejected => {
                StatusCode::UNAUTHORIZED
            }
            Self::Token(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingToken => "MISSING_PARAMETER",
            Self::InvalidAuthorization => "INVALID_AUTHORIZATION",
            Self::Body(_) => "INVALID_BODY",
            Self::Unauthenticated => "UNAUTHORIZED",
            Self::LoginRejected => "LOGIN_FAILED",
            Self::Token(e) => e.error_code(),
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Token(e) if e.is_internal())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Backend detail stays in the log
        let message = if self.is_internal() {
            tracing::error!(error = %self, "token engine failure");
            "internal error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}
