//! API error type and its `{"error": message}` response body.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use shared::{models::ErrorResponse, validation::PasswordError};
use thiserror::Error;
use tracing::{error, warn};

use crate::{
    auth::{password::PasswordHashError, token::TokenError},
    services::RepositoryError,
};

/// Result alias for handlers.
pub type AppResult<T> = Result<T, ApiError>;

/// Message returned to clients for every server-side failure.
const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// Error type returned by every handler and middleware.
///
/// Renders as `{"error": <message>}`. The `code` is only logged; the message
/// text is the client-facing contract.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<String>,
}

impl ApiError {
    /// Error with an explicit status and machine code.
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    /// A 400 response.
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    /// A required body field was absent, `null` or empty.
    pub fn missing_field(field: &str) -> Self {
        Self::bad_request("missing_field", format!("Missing {field} in request body"))
    }

    /// Registration hit an existing user name.
    pub fn username_taken() -> Self {
        Self::bad_request("username_taken", "Username already taken")
    }

    /// Login failure. Identical for unknown users and wrong passwords.
    pub fn invalid_credentials() -> Self {
        Self::bad_request("invalid_credentials", "Incorrect user_name or password")
    }

    /// A 401 from the bearer guard.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    /// A 404 for a missing resource.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    /// A server-side failure; `details` is logged but never sent to clients.
    pub fn internal_server_error(details: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal_error",
            message: INTERNAL_ERROR_MESSAGE.to_string(),
            details: Some(details.into()),
        }
    }

    /// HTTP status of the response.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine code used in logs and metric labels.
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Client-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(
                code = self.code,
                status = self.status.as_u16(),
                details = self.details.as_deref().unwrap_or_default(),
                "request failed"
            );
        } else {
            warn!(
                code = self.code,
                status = self.status.as_u16(),
                message = %self.message,
                "request rejected"
            );
        }

        let mut response = (self.status, Json(ErrorResponse::new(self.message))).into_response();
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        Self::bad_request("weak_password", err.to_string())
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateUserName => Self::username_taken(),
            RepositoryError::Database(db_err) => Self::from(db_err),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let code = db_err
                .code()
                .unwrap_or_else(|| std::borrow::Cow::Borrowed("unknown"));
            return Self::internal_server_error(format!(
                "database error {code}: {}",
                db_err.message()
            ));
        }

        Self::internal_server_error(err.to_string())
    }
}

impl From<PasswordHashError> for ApiError {
    fn from(err: PasswordHashError) -> Self {
        Self::internal_server_error(err.to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        Self::internal_server_error(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("invalid_body", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request("invalid_path", rejection.body_text())
    }
}
