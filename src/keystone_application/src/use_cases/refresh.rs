use keystone_core::{
    SecretProvider, TokenPair, TransactionManager, TxScope, UserStore, UserStoreError,
};

use crate::{
    error::AuthError, token_issuer::TokenIssuer, transaction_coordinator::TransactionCoordinator,
};

/// Refresh use case - trades a refresh token for a new pair, once
pub struct RefreshUseCase<'a, M, U, S>
where
    M: TransactionManager,
{
    coordinator: &'a TransactionCoordinator<M>,
    user_store: &'a U,
    tokens: &'a TokenIssuer<S>,
}

impl<'a, M, U, S> RefreshUseCase<'a, M, U, S>
where
    M: TransactionManager,
    U: UserStore<Handle = M::Handle>,
    S: SecretProvider,
{
    pub fn new(
        coordinator: &'a TransactionCoordinator<M>,
        user_store: &'a U,
        tokens: &'a TokenIssuer<S>,
    ) -> Self {
        Self {
            coordinator,
            user_store,
            tokens,
        }
    }

    #[tracing::instrument(name = "RefreshUseCase::execute", skip_all)]
    pub async fn execute(
        &self,
        scope: &TxScope<M::Handle>,
        refresh_token: &str,
    ) -> Result<TokenPair, AuthError> {
        self.coordinator
            .run(scope, move |scope| async move {
                let mut user = match self
                    .user_store
                    .get_by_refresh_token(&scope, refresh_token)
                    .await
                {
                    Ok(user) => user,
                    Err(UserStoreError::UserNotFound) => {
                        return Err(AuthError::UnauthorizedRefresh);
                    }
                    Err(e) => return Err(e.into()),
                };

                if !user.holds_refresh_token(refresh_token) {
                    return Err(AuthError::UnauthorizedRefresh);
                }

                let tokens = self.tokens.issue(&mut user)?;
                self.user_store.update(&scope, &user).await?;

                Ok(tokens)
            })
            .await
    }
}
