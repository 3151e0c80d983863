use std::sync::Arc;

use async_trait::async_trait;
use keystone_core::{CurrentHandle, TransactionError, TransactionManager, TxScope};
use sqlx::{PgConnection, PgPool, Postgres, Transaction, pool::PoolConnection};
use tokio::sync::{Mutex, MutexGuard};

const SQLSTATE_SERIALIZATION_FAILURE: &str = "40001";
const SQLSTATE_DEADLOCK_DETECTED: &str = "40P01";
const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";

/// Shared handle to an open PostgreSQL transaction.
///
/// Dropping the last clone without committing rolls the transaction back.
#[derive(Clone)]
pub struct PgTransaction {
    inner: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
}

#[derive(Clone)]
pub struct PostgresTransactionManager {
    pool: PgPool,
}

impl PostgresTransactionManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionManager for PostgresTransactionManager {
    type Handle = PgTransaction;

    #[tracing::instrument(name = "Begin serializable transaction", skip_all)]
    async fn begin(&self) -> Result<PgTransaction, TransactionError> {
        let mut tx = self.pool.begin().await.map_err(transaction_error)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(transaction_error)?;

        Ok(PgTransaction {
            inner: Arc::new(Mutex::new(Some(tx))),
        })
    }

    #[tracing::instrument(name = "Commit transaction", skip_all)]
    async fn commit(&self, handle: PgTransaction) -> Result<(), TransactionError> {
        let tx = handle.inner.lock().await.take().ok_or_else(|| {
            TransactionError::UnexpectedError("transaction already finished".to_string())
        })?;
        tx.commit().await.map_err(transaction_error)
    }

    #[tracing::instrument(name = "Roll back transaction", skip_all)]
    async fn rollback(&self, handle: PgTransaction) -> Result<(), TransactionError> {
        match handle.inner.lock().await.take() {
            Some(tx) => tx.rollback().await.map_err(transaction_error),
            None => Ok(()),
        }
    }
}

/// Connection a statement runs on: the scope's transaction or a pooled one.
pub(crate) enum PgExecutor<'a> {
    Transaction(MutexGuard<'a, Option<Transaction<'static, Postgres>>>),
    Pool(PoolConnection<Postgres>),
}

impl<'a> PgExecutor<'a> {
    pub(crate) async fn acquire(
        pool: &PgPool,
        scope: &'a TxScope<PgTransaction>,
    ) -> Result<Self, sqlx::Error> {
        match scope.current() {
            CurrentHandle::Transaction(tx) => Ok(PgExecutor::Transaction(tx.inner.lock().await)),
            CurrentHandle::Default => Ok(PgExecutor::Pool(pool.acquire().await?)),
        }
    }

    pub(crate) fn connection(&mut self) -> Result<&mut PgConnection, sqlx::Error> {
        match self {
            PgExecutor::Transaction(guard) => {
                let tx: &mut Option<Transaction<'static, Postgres>> = guard;
                tx.as_mut()
                    .map(|tx| &mut **tx)
                    .ok_or_else(|| sqlx::Error::Protocol("transaction already finished".to_string()))
            }
            PgExecutor::Pool(conn) => Ok(&mut **conn),
        }
    }
}

fn sqlstate(error: &sqlx::Error) -> Option<String> {
    error
        .as_database_error()
        .and_then(|db_error| db_error.code())
        .map(|code| code.into_owned())
}

pub(crate) fn is_serialization_failure(error: &sqlx::Error) -> bool {
    matches!(
        sqlstate(error).as_deref(),
        Some(SQLSTATE_SERIALIZATION_FAILURE | SQLSTATE_DEADLOCK_DETECTED)
    )
}

pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    sqlstate(error).as_deref() == Some(SQLSTATE_UNIQUE_VIOLATION)
}

fn transaction_error(error: sqlx::Error) -> TransactionError {
    if is_serialization_failure(&error) {
        TransactionError::SerializationConflict
    } else {
        TransactionError::UnexpectedError(error.to_string())
    }
}
