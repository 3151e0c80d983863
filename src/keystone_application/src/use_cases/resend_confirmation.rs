use keystone_core::{
    Email, OutboxStore, RegisterEvent, TransactionManager, TxScope, UserStore,
};
use secrecy::ExposeSecret;

use crate::{
    confirm_link::ConfirmLinkBuilder, error::AuthError, event_publisher::OutboxPublisher,
    transaction_coordinator::TransactionCoordinator,
};

/// Resend confirmation use case - replaces the register token of an
/// unconfirmed account and stages a new confirmation event
pub struct ResendConfirmationUseCase<'a, M, U, O>
where
    M: TransactionManager,
{
    coordinator: &'a TransactionCoordinator<M>,
    user_store: &'a U,
    publisher: &'a OutboxPublisher<O>,
    links: &'a ConfirmLinkBuilder,
}

impl<'a, M, U, O> ResendConfirmationUseCase<'a, M, U, O>
where
    M: TransactionManager,
    U: UserStore<Handle = M::Handle>,
    O: OutboxStore<Handle = M::Handle>,
{
    pub fn new(
        coordinator: &'a TransactionCoordinator<M>,
        user_store: &'a U,
        publisher: &'a OutboxPublisher<O>,
        links: &'a ConfirmLinkBuilder,
    ) -> Self {
        Self {
            coordinator,
            user_store,
            publisher,
            links,
        }
    }

    #[tracing::instrument(name = "ResendConfirmationUseCase::execute", skip(self, scope))]
    pub async fn execute(&self, scope: &TxScope<M::Handle>, email: Email) -> Result<(), AuthError> {
        let email = &email;

        self.coordinator
            .run(scope, move |scope| async move {
                let mut user = self.user_store.get_by_email(&scope, email).await?;
                let confirm_link = {
                    let token = user.issue_register_token()?;
                    self.links.build(email, token)
                };
                self.user_store.update(&scope, &user).await?;

                self.publisher
                    .publish(&scope, &RegisterEvent {
                        email: user.email().as_ref().expose_secret().clone(),
                        confirm_link,
                    })
                    .await?;
                Ok(())
            })
            .await
    }
}
