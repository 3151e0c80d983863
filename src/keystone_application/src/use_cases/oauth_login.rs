use keystone_core::{
    Email, HashedPassword, LoginEvent, OutboxStore, Password, RegisterEvent, SecretProvider,
    TokenPair, TransactionManager, TxScope, User, UserStore, UserStoreError,
    generate_random_string,
};
use secrecy::{ExposeSecret, Secret};

use crate::{
    confirm_link::ConfirmLinkBuilder, error::AuthError, event_publisher::OutboxPublisher,
    hashing::compute_password_hash, token_issuer::TokenIssuer,
    transaction_coordinator::TransactionCoordinator,
};

/// Length of the throwaway password given to accounts created through OAuth.
const OAUTH_PASSWORD_LENGTH: usize = 72;

/// Outcome of an OAuth sign-in.
#[derive(Debug, Clone)]
pub struct OAuthLogin {
    pub tokens: TokenPair,
    /// True when the sign-in created the account.
    pub registered: bool,
}

/// OAuth login use case - signs in a verified external identity, creating
/// the account on first use
pub struct OAuthLoginUseCase<'a, M, U, O, S>
where
    M: TransactionManager,
{
    coordinator: &'a TransactionCoordinator<M>,
    user_store: &'a U,
    publisher: &'a OutboxPublisher<O>,
    tokens: &'a TokenIssuer<S>,
    links: &'a ConfirmLinkBuilder,
}

impl<'a, M, U, O, S> OAuthLoginUseCase<'a, M, U, O, S>
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
        links: &'a ConfirmLinkBuilder,
    ) -> Self {
        Self {
            coordinator,
            user_store,
            publisher,
            tokens,
            links,
        }
    }

    #[tracing::instrument(name = "OAuthLoginUseCase::execute", skip(self, scope))]
    pub async fn execute(
        &self,
        scope: &TxScope<M::Handle>,
        email: Email,
    ) -> Result<OAuthLogin, AuthError> {
        // Hashed once, outside the transaction.
        let password_hash = match self.user_store.get_by_email(scope, &email).await {
            Ok(_) => None,
            Err(UserStoreError::UserNotFound) => Some(throwaway_password_hash().await?),
            Err(e) => return Err(e.into()),
        };
        let email = &email;
        let password_hash = &password_hash;

        self.coordinator
            .run(scope, move |scope| async move {
                match self.user_store.get_by_email(&scope, email).await {
                    Ok(mut user) => {
                        let tokens = self.tokens.issue(&mut user)?;
                        self.user_store.update(&scope, &user).await?;
                        self.publisher
                            .publish(&scope, &LoginEvent {
                                email: user.email().as_ref().expose_secret().clone(),
                            })
                            .await?;

                        Ok(OAuthLogin {
                            tokens,
                            registered: false,
                        })
                    }
                    Err(UserStoreError::UserNotFound) => {
                        let Some(password_hash) = password_hash.clone() else {
                            return Err(AuthError::Unexpected(
                                "account disappeared during OAuth login".to_string(),
                            ));
                        };

                        let mut user = User::create(email.clone(), password_hash);
                        let tokens = self.tokens.issue(&mut user)?;
                        self.user_store.create(&scope, &user).await?;

                        let confirm_link = match user.register_token() {
                            Some(token) => self.links.build(user.email(), token),
                            None => {
                                return Err(AuthError::Unexpected(
                                    "new user has no register token".to_string(),
                                ));
                            }
                        };
                        self.publisher
                            .publish(&scope, &RegisterEvent {
                                email: user.email().as_ref().expose_secret().clone(),
                                confirm_link,
                            })
                            .await?;

                        Ok(OAuthLogin {
                            tokens,
                            registered: true,
                        })
                    }
                    Err(e) => Err(e.into()),
                }
            })
            .await
    }
}

async fn throwaway_password_hash() -> Result<HashedPassword, AuthError> {
    let password = Password::try_from(Secret::new(generate_random_string(OAUTH_PASSWORD_LENGTH)))?;
    compute_password_hash(password).await
}
