use keystone_core::{
    AccessTokenError, ConflictAware, OutboxStoreError, TransactionError, UserError,
    UserStoreError,
};

/// Failure of an authentication use case.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("User already exists")]
    Duplicate,
    #[error("User not found")]
    NotFound,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Refresh token is invalid or expired")]
    UnauthorizedRefresh,
    #[error("Invalid register token")]
    InvalidRegisterToken,
    #[error("Access token rejected: {0}")]
    UnauthorizedAccess(String),
    #[error("Serialization conflict")]
    Conflict,
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ConflictAware for AuthError {
    fn is_serialization_conflict(&self) -> bool {
        matches!(self, Self::Conflict)
    }
}

impl From<UserStoreError> for AuthError {
    fn from(error: UserStoreError) -> Self {
        match error {
            UserStoreError::UserAlreadyExists => AuthError::Duplicate,
            UserStoreError::UserNotFound => AuthError::NotFound,
            UserStoreError::SerializationConflict => AuthError::Conflict,
            UserStoreError::UnexpectedError(e) => AuthError::Unexpected(e),
        }
    }
}

impl From<OutboxStoreError> for AuthError {
    fn from(error: OutboxStoreError) -> Self {
        match error {
            OutboxStoreError::SerializationConflict => AuthError::Conflict,
            OutboxStoreError::Encoding(e) | OutboxStoreError::UnexpectedError(e) => {
                AuthError::Unexpected(e)
            }
        }
    }
}

impl From<TransactionError> for AuthError {
    fn from(error: TransactionError) -> Self {
        match error {
            TransactionError::SerializationConflict => AuthError::Conflict,
            TransactionError::RetriesExhausted { .. } => AuthError::Unexpected(error.to_string()),
            TransactionError::UnexpectedError(e) => AuthError::Unexpected(e),
        }
    }
}

impl From<UserError> for AuthError {
    fn from(error: UserError) -> Self {
        match error {
            UserError::InvalidEmail | UserError::InvalidPassword | UserError::AlreadyConfirmed => {
                AuthError::Validation(error.to_string())
            }
            UserError::InvalidRegisterToken => AuthError::InvalidRegisterToken,
            UserError::PasswordHash(e) => AuthError::Unexpected(e),
            UserError::AccessToken(e) => AuthError::Unexpected(e.to_string()),
        }
    }
}

impl From<AccessTokenError> for AuthError {
    fn from(error: AccessTokenError) -> Self {
        match error {
            AccessTokenError::Expired | AccessTokenError::Invalid(_) => {
                AuthError::UnauthorizedAccess(error.to_string())
            }
            AccessTokenError::Signing(e) => AuthError::Unexpected(e),
        }
    }
}
