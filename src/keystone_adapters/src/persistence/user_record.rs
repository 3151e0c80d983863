use chrono::{DateTime, Utc};
use keystone_core::{
    Email, HashedPassword, RefreshToken, RegisterToken, User, UserId, UserStoreError,
};
use secrecy::{ExposeSecret, Secret};
use uuid::Uuid;

/// Flat, persisted shape of a [`User`]. The access token is never stored.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub confirmed: bool,
    pub refresh_token: Option<String>,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    pub register_token: Option<String>,
    pub register_token_expires_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().as_uuid(),
            email: user.email().as_ref().expose_secret().clone(),
            password_hash: user.password_hash().as_ref().expose_secret().clone(),
            confirmed: user.is_confirmed(),
            refresh_token: user.refresh_token().map(|t| t.as_str().to_string()),
            refresh_token_expires_at: user.refresh_token().map(RefreshToken::expires_at),
            register_token: user.register_token().map(|t| t.as_str().to_string()),
            register_token_expires_at: user.register_token().map(RegisterToken::expires_at),
        }
    }
}

impl TryFrom<UserRecord> for User {
    type Error = UserStoreError;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        let email = Email::try_from(Secret::new(record.email))
            .map_err(|e| UserStoreError::UnexpectedError(e.to_string()))?;
        let password_hash = HashedPassword::parse(Secret::new(record.password_hash))
            .map_err(|e| UserStoreError::UnexpectedError(e.to_string()))?;

        let refresh_token = match (record.refresh_token, record.refresh_token_expires_at) {
            (Some(token), Some(expires_at)) => Some(RefreshToken::restore(token, expires_at)),
            _ => None,
        };
        let register_token = match (record.register_token, record.register_token_expires_at) {
            (Some(token), Some(expires_at)) => Some(RegisterToken::restore(token, expires_at)),
            _ => None,
        };

        Ok(User::restore(
            UserId::from(record.id),
            email,
            password_hash,
            record.confirmed,
            refresh_token,
            register_token,
        ))
    }
}
