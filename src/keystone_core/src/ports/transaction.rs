use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Serialization conflict")]
    SerializationConflict,
    #[error("Transaction still conflicting after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
    #[error("Unexpected error {0}")]
    UnexpectedError(String),
}

/// Errors that can tell a retryable write conflict apart from a real failure.
pub trait ConflictAware {
    fn is_serialization_conflict(&self) -> bool;
}

impl ConflictAware for TransactionError {
    fn is_serialization_conflict(&self) -> bool {
        matches!(self, Self::SerializationConflict)
    }
}

/// Starts and finishes serializable transactions on one database.
///
/// `Handle` is a cheap, cloneable reference to an open transaction. Stores
/// receive it through a [`TxScope`] and run their statements against it.
#[async_trait]
pub trait TransactionManager: Send + Sync {
    type Handle: Clone + Send + Sync + 'static;

    async fn begin(&self) -> Result<Self::Handle, TransactionError>;
    async fn commit(&self, handle: Self::Handle) -> Result<(), TransactionError>;
    async fn rollback(&self, handle: Self::Handle) -> Result<(), TransactionError>;
}

/// The transaction a persistence call runs in, passed explicitly.
///
/// A scope without a handle means "no transaction": stores fall back to
/// their default, auto-committing connection.
#[derive(Debug, Clone)]
pub struct TxScope<H> {
    handle: Option<H>,
}

impl<H> TxScope<H> {
    /// Scope outside of any transaction.
    pub fn root() -> Self {
        Self { handle: None }
    }

    pub fn with_transaction(handle: H) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    pub fn current(&self) -> CurrentHandle<'_, H> {
        match &self.handle {
            Some(handle) => CurrentHandle::Transaction(handle),
            None => CurrentHandle::Default,
        }
    }
}

impl<H> Default for TxScope<H> {
    fn default() -> Self {
        Self::root()
    }
}

#[derive(Debug)]
pub enum CurrentHandle<'a, H> {
    Transaction(&'a H),
    Default,
}
