use keystone_core::{Email, TransactionManager, TxScope, UserStore};

use crate::{error::AuthError, transaction_coordinator::TransactionCoordinator};

/// Confirm use case - consumes the register token mailed at signup
pub struct ConfirmUseCase<'a, M, U>
where
    M: TransactionManager,
{
    coordinator: &'a TransactionCoordinator<M>,
    user_store: &'a U,
}

impl<'a, M, U> ConfirmUseCase<'a, M, U>
where
    M: TransactionManager,
    U: UserStore<Handle = M::Handle>,
{
    pub fn new(coordinator: &'a TransactionCoordinator<M>, user_store: &'a U) -> Self {
        Self {
            coordinator,
            user_store,
        }
    }

    #[tracing::instrument(name = "ConfirmUseCase::execute", skip(self, scope, register_token))]
    pub async fn execute(
        &self,
        scope: &TxScope<M::Handle>,
        email: Email,
        register_token: &str,
    ) -> Result<(), AuthError> {
        let email = &email;

        self.coordinator
            .run(scope, move |scope| async move {
                let mut user = self.user_store.get_by_email(&scope, email).await?;
                user.confirm(register_token)?;
                self.user_store.update(&scope, &user).await?;
                Ok(())
            })
            .await
    }
}
