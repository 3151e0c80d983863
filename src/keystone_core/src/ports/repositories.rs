use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    email::Email,
    outbox::{NewOutboxMessage, OutboxMessage, Topic},
    user::{User, UserId},
};

use super::transaction::{ConflictAware, TxScope};

// UserStore port trait and errors
#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("User already exists")]
    UserAlreadyExists,
    #[error("User not found")]
    UserNotFound,
    #[error("Serialization conflict")]
    SerializationConflict,
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

impl PartialEq for UserStoreError {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::UserAlreadyExists, Self::UserAlreadyExists)
                | (Self::UserNotFound, Self::UserNotFound)
                | (Self::SerializationConflict, Self::SerializationConflict)
                | (Self::UnexpectedError(_), Self::UnexpectedError(_))
        )
    }
}

impl ConflictAware for UserStoreError {
    fn is_serialization_conflict(&self) -> bool {
        matches!(self, Self::SerializationConflict)
    }
}

/// Durable storage of user accounts.
///
/// Every call runs inside the transaction carried by `scope`, or on the
/// default connection when the scope has none.
#[async_trait]
pub trait UserStore: Send + Sync {
    type Handle: Send + Sync;

    async fn create(&self, scope: &TxScope<Self::Handle>, user: &User)
    -> Result<(), UserStoreError>;
    async fn update(&self, scope: &TxScope<Self::Handle>, user: &User)
    -> Result<(), UserStoreError>;
    async fn get_by_id(
        &self,
        scope: &TxScope<Self::Handle>,
        id: UserId,
    ) -> Result<User, UserStoreError>;
    async fn get_by_email(
        &self,
        scope: &TxScope<Self::Handle>,
        email: &Email,
    ) -> Result<User, UserStoreError>;
    async fn get_by_refresh_token(
        &self,
        scope: &TxScope<Self::Handle>,
        refresh_token: &str,
    ) -> Result<User, UserStoreError>;
}

// OutboxStore port trait and errors
#[derive(Debug, Error)]
pub enum OutboxStoreError {
    #[error("Serialization conflict")]
    SerializationConflict,
    #[error("Failed to encode outbox payload: {0}")]
    Encoding(String),
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

impl ConflictAware for OutboxStoreError {
    fn is_serialization_conflict(&self) -> bool {
        matches!(self, Self::SerializationConflict)
    }
}

/// Staging table for events awaiting delivery to the message bus.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    type Handle: Send + Sync;

    async fn append(
        &self,
        scope: &TxScope<Self::Handle>,
        message: NewOutboxMessage,
    ) -> Result<(), OutboxStoreError>;

    async fn append_batch(
        &self,
        scope: &TxScope<Self::Handle>,
        messages: Vec<NewOutboxMessage>,
    ) -> Result<(), OutboxStoreError>;

    /// Select up to `limit` of the oldest pending rows of `topic` and mark
    /// them delivered in the same step.
    async fn claim_batch(
        &self,
        scope: &TxScope<Self::Handle>,
        topic: &Topic,
        limit: u32,
    ) -> Result<Vec<OutboxMessage>, OutboxStoreError>;

    /// Soft-delete a row so it is never claimed. Returns whether a row matched.
    async fn discard(
        &self,
        scope: &TxScope<Self::Handle>,
        key: Uuid,
    ) -> Result<bool, OutboxStoreError>;
}
