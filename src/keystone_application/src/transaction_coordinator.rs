use std::future::Future;

use keystone_core::{ConflictAware, CurrentHandle, TransactionError, TransactionManager, TxScope};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Runs units of work inside serializable transactions.
///
/// A unit of work receives the [`TxScope`] it must hand to every store call.
/// When the caller's scope already carries a transaction the unit of work
/// joins it; otherwise a new transaction is started, committed on success and
/// rolled back on failure. Serialization conflicts restart the whole
/// begin/execute/commit sequence up to `max_attempts` times.
#[derive(Debug, Clone)]
pub struct TransactionCoordinator<M> {
    manager: M,
    max_attempts: u32,
}

impl<M> TransactionCoordinator<M>
where
    M: TransactionManager,
{
    pub fn new(manager: M) -> Self {
        Self {
            manager,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    /// The transaction `scope` is bound to, or the default handle.
    pub fn current_handle<'s>(&self, scope: &'s TxScope<M::Handle>) -> CurrentHandle<'s, M::Handle> {
        scope.current()
    }

    pub async fn run<T, E, F, Fut>(
        &self,
        scope: &TxScope<M::Handle>,
        mut unit_of_work: F,
    ) -> Result<T, E>
    where
        F: FnMut(TxScope<M::Handle>) -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        E: From<TransactionError> + ConflictAware + std::fmt::Display + Send,
        T: Send,
    {
        if scope.is_active() {
            return unit_of_work(scope.clone()).await;
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.run_once(&mut unit_of_work).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_serialization_conflict() => {
                    if attempt >= self.max_attempts {
                        tracing::warn!(attempts = attempt, "Giving up on conflicting transaction");
                        return Err(E::from(TransactionError::RetriesExhausted {
                            attempts: attempt,
                        }));
                    }
                    tracing::debug!(attempt, "Serialization conflict, retrying transaction");
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn run_once<T, E, F, Fut>(&self, unit_of_work: &mut F) -> Result<T, E>
    where
        F: FnMut(TxScope<M::Handle>) -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        E: From<TransactionError> + std::fmt::Display + Send,
        T: Send,
    {
        let handle = self.manager.begin().await?;

        match unit_of_work(TxScope::with_transaction(handle.clone())).await {
            Ok(value) => {
                self.manager.commit(handle).await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_error) = self.manager.rollback(handle).await {
                    tracing::warn!(
                        error = %rollback_error,
                        cause = %e,
                        "Failed to roll back transaction"
                    );
                }
                Err(e)
            }
        }
    }
}
