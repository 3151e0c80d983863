use keystone_core::{
    Email, LoginEvent, OutboxStore, Password, SecretProvider, TokenPair, TransactionManager,
    TxScope, UserStore,
};
use secrecy::ExposeSecret;

use crate::{
    error::AuthError, event_publisher::OutboxPublisher, hashing::verify_password_hash,
    token_issuer::TokenIssuer, transaction_coordinator::TransactionCoordinator,
};

/// Login use case - checks credentials and rotates the user's tokens
pub struct LoginUseCase<'a, M, U, O, S>
where
    M: TransactionManager,
{
    coordinator: &'a TransactionCoordinator<M>,
    user_store: &'a U,
    publisher: &'a OutboxPublisher<O>,
    tokens: &'a TokenIssuer<S>,
}

impl<'a, M, U, O, S> LoginUseCase<'a, M, U, O, S>
where
    M: TransactionManager,
    U: UserStore<Handle = M::Handle>,
    O: OutboxStore<Handle = M::Handle>,
    S: SecretProvider,
{
    pub fn new(
        coordinator: &'a TransactionCoordinator<M>,
        user_store: &'a U,
        publisher: &'a OutboxPublisher<O>,
        tokens: &'a TokenIssuer<S>,
    ) -> Self {
        Self {
            coordinator,
            user_store,
            publisher,
            tokens,
        }
    }

    /// Execute the login use case
    ///
    /// # Returns
    /// A fresh access/refresh pair. The previous refresh token stops working.
    #[tracing::instrument(name = "LoginUseCase::execute", skip(self, scope, password))]
    pub async fn execute(
        &self,
        scope: &TxScope<M::Handle>,
        email: Email,
        password: Password,
    ) -> Result<TokenPair, AuthError> {
        let email = &email;
        let password = &password;

        self.coordinator
            .run(scope, move |scope| async move {
                let mut user = self.user_store.get_by_email(&scope, email).await?;

                let matches =
                    verify_password_hash(user.password_hash().clone(), password.clone()).await?;
                if !matches {
                    return Err(AuthError::InvalidCredentials);
                }

                let tokens = self.tokens.issue(&mut user)?;
                self.user_store.update(&scope, &user).await?;

                let event = LoginEvent {
                    email: user.email().as_ref().expose_secret().clone(),
                };
                self.publisher.publish(&scope, &event).await?;

                Ok(tokens)
            })
            .await
    }
}
