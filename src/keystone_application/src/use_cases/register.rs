use keystone_core::{
    Email, OutboxStore, Password, RegisterEvent, TransactionManager, TxScope, User, UserId,
    UserStore,
};
use secrecy::ExposeSecret;

use crate::{
    confirm_link::ConfirmLinkBuilder, error::AuthError, event_publisher::OutboxPublisher,
    hashing::compute_password_hash, transaction_coordinator::TransactionCoordinator,
};

/// Register use case - creates an unconfirmed account and stages its
/// confirmation event
pub struct RegisterUseCase<'a, M, U, O>
where
    M: TransactionManager,
{
    coordinator: &'a TransactionCoordinator<M>,
    user_store: &'a U,
    publisher: &'a OutboxPublisher<O>,
    links: &'a ConfirmLinkBuilder,
}

impl<'a, M, U, O> RegisterUseCase<'a, M, U, O>
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

    /// Execute the register use case
    ///
    /// # Arguments
    /// * `scope` - Transaction to join, or the root scope
    /// * `email` - Address of the new account
    /// * `password` - Plaintext password, hashed before anything is stored
    ///
    /// # Returns
    /// The id of the new user
    #[tracing::instrument(name = "RegisterUseCase::execute", skip(self, scope, password))]
    pub async fn execute(
        &self,
        scope: &TxScope<M::Handle>,
        email: Email,
        password: Password,
    ) -> Result<UserId, AuthError> {
        let password_hash = compute_password_hash(password).await?;

        self.coordinator
            .run(scope, |scope| {
                let user = User::create(email.clone(), password_hash.clone());
                async move {
                    self.user_store.create(&scope, &user).await?;

                    let Some(register_token) = user.register_token() else {
                        return Err(AuthError::Unexpected(
                            "new user has no register token".to_string(),
                        ));
                    };
                    let event = RegisterEvent {
                        email: user.email().as_ref().expose_secret().clone(),
                        confirm_link: self.links.build(user.email(), register_token),
                    };
                    self.publisher.publish(&scope, &event).await?;

                    Ok(user.id())
                }
            })
            .await
    }
}
