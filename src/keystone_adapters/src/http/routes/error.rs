use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use keystone_application::AuthError;
use keystone_core::UserError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum AuthApiError {
    #[error("User not found")]
    UserNotFound,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Refresh token is invalid or expired")]
    InvalidRefreshToken,

    #[error("Invalid register token")]
    InvalidRegisterToken,

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match self {
            AuthApiError::InvalidInput(_) | AuthApiError::InvalidRegisterToken => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }

            AuthApiError::UserAlreadyExists => (StatusCode::CONFLICT, self.to_string()),

            AuthApiError::UserNotFound => (StatusCode::NOT_FOUND, self.to_string()),

            AuthApiError::InvalidCredentials
            | AuthApiError::InvalidRefreshToken
            | AuthApiError::AuthenticationError(_) => (StatusCode::UNAUTHORIZED, self.to_string()),

            AuthApiError::UnexpectedError(ref e) => {
                tracing::error!(error = %e, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status_code, body).into_response()
    }
}

impl From<UserError> for AuthApiError {
    fn from(error: UserError) -> Self {
        AuthApiError::InvalidInput(error.to_string())
    }
}

impl From<AuthError> for AuthApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Duplicate => AuthApiError::UserAlreadyExists,
            AuthError::NotFound => AuthApiError::UserNotFound,
            AuthError::InvalidCredentials => AuthApiError::InvalidCredentials,
            AuthError::UnauthorizedRefresh => AuthApiError::InvalidRefreshToken,
            AuthError::InvalidRegisterToken => AuthApiError::InvalidRegisterToken,
            AuthError::UnauthorizedAccess(e) => AuthApiError::AuthenticationError(e),
            AuthError::Validation(e) => AuthApiError::InvalidInput(e),
            AuthError::Conflict => AuthApiError::UnexpectedError(error.to_string()),
            AuthError::Unexpected(e) => AuthApiError::UnexpectedError(e),
        }
    }
}
