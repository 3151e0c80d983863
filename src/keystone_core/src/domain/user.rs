use std::fmt;

use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{
    email::Email,
    password::{HashedPassword, Password},
    tokens::{
        AccessToken, AccessTokenError, AccessTokenPayload, RefreshToken, RegisterToken,
        TokenPair, TokenPolicy,
    },
};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Password must not be empty")]
    InvalidPassword,
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
    #[error("Invalid register token")]
    InvalidRegisterToken,
    #[error("Account is already confirmed")]
    AlreadyConfirmed,
    #[error("{0}")]
    AccessToken(#[from] AccessTokenError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for UserId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One account and the credentials currently attached to it.
///
/// Mutations happen on an in-memory copy loaded inside a transaction and are
/// persisted through [`crate::UserStore::update`].
#[derive(Debug, Clone)]
pub struct User {
    id: UserId,
    email: Email,
    password_hash: HashedPassword,
    confirmed: bool,
    access_token: Option<AccessToken>,
    refresh_token: Option<RefreshToken>,
    register_token: Option<RegisterToken>,
}

impl User {
    /// A new, unconfirmed account holding a fresh register token.
    pub fn create(email: Email, password_hash: HashedPassword) -> Self {
        Self {
            id: UserId::new(),
            email,
            password_hash,
            confirmed: false,
            access_token: None,
            refresh_token: None,
            register_token: Some(RegisterToken::new()),
        }
    }

    /// Rebuild an account from persisted state.
    pub fn restore(
        id: UserId,
        email: Email,
        password_hash: HashedPassword,
        confirmed: bool,
        refresh_token: Option<RefreshToken>,
        register_token: Option<RegisterToken>,
    ) -> Self {
        Self {
            id,
            email,
            password_hash,
            confirmed,
            access_token: None,
            refresh_token,
            register_token,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password_hash(&self) -> &HashedPassword {
        &self.password_hash
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    pub fn refresh_token(&self) -> Option<&RefreshToken> {
        self.refresh_token.as_ref()
    }

    pub fn register_token(&self) -> Option<&RegisterToken> {
        self.register_token.as_ref()
    }

    pub fn verify_password(&self, candidate: &Password) -> bool {
        self.password_hash.verify(candidate)
    }

    /// True when `candidate` is the current, unexpired refresh token.
    pub fn holds_refresh_token(&self, candidate: &str) -> bool {
        self.refresh_token
            .as_ref()
            .is_some_and(|token| token.matches(candidate) && token.is_valid())
    }

    /// Issue a new access/refresh pair, replacing whatever was held before.
    pub fn rotate_tokens(
        &mut self,
        policy: &TokenPolicy,
        signing_key: &Secret<String>,
    ) -> Result<TokenPair, UserError> {
        let payload = AccessTokenPayload {
            user_id: self.id,
            email: self.email.as_ref().expose_secret().clone(),
        };
        let access_token = AccessToken::new(
            policy.access_ttl,
            signing_key.expose_secret().as_bytes(),
            payload,
        )?;
        let refresh_token = RefreshToken::new(policy.refresh_ttl);

        self.access_token = Some(access_token.clone());
        self.refresh_token = Some(refresh_token.clone());

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Replace the register token. Only unconfirmed accounts need one.
    pub fn issue_register_token(&mut self) -> Result<&RegisterToken, UserError> {
        if self.confirmed {
            return Err(UserError::AlreadyConfirmed);
        }
        Ok(self.register_token.insert(RegisterToken::new()))
    }

    /// Confirm the account with the presented register token.
    ///
    /// The token is consumed: a successful confirmation clears it.
    pub fn confirm(&mut self, presented: &str) -> Result<(), UserError> {
        let Some(token) = self.register_token.as_ref() else {
            return Err(UserError::InvalidRegisterToken);
        };
        if !token.is_valid() || !token.matches(presented) {
            return Err(UserError::InvalidRegisterToken);
        }

        self.confirmed = true;
        self.register_token = None;
        Ok(())
    }
}
