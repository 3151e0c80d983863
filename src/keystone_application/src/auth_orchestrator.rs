use std::sync::Arc;

use async_trait::async_trait;
use keystone_core::{
    AccessTokenClaims, Email, MetricsSink, OutboxStore, Password, SecretProvider, TokenPair,
    TransactionManager, TxScope, UserId, UserStore,
};

use crate::{
    confirm_link::ConfirmLinkBuilder,
    error::AuthError,
    event_publisher::OutboxPublisher,
    token_issuer::TokenIssuer,
    transaction_coordinator::TransactionCoordinator,
    use_cases::{
        ConfirmUseCase, LoginUseCase, OAuthLogin, OAuthLoginUseCase, RefreshUseCase,
        RegisterUseCase, ResendConfirmationUseCase, VerifyAccessTokenUseCase,
    },
};

/// Authentication operations exposed to inbound adapters.
#[async_trait]
pub trait AuthApi: Send + Sync + 'static {
    async fn register(&self, email: Email, password: Password) -> Result<UserId, AuthError>;
    async fn login(&self, email: Email, password: Password) -> Result<TokenPair, AuthError>;
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;
    async fn confirm(&self, email: Email, register_token: &str) -> Result<(), AuthError>;
    async fn oauth_login(&self, email: Email) -> Result<OAuthLogin, AuthError>;
    async fn resend_confirmation(&self, email: Email) -> Result<(), AuthError>;
    fn verify_access_token(&self, access_token: &str) -> Result<AccessTokenClaims, AuthError>;
}

/// Wires the use cases to one set of ports.
///
/// Every operation starts from the root scope, so each call is its own
/// transaction. The `*_use_case` accessors hand out the underlying use cases
/// for callers that need to compose several of them in one transaction.
pub struct AuthOrchestrator<M, U, O, S>
where
    M: TransactionManager,
{
    coordinator: TransactionCoordinator<M>,
    user_store: U,
    publisher: OutboxPublisher<O>,
    tokens: TokenIssuer<S>,
    links: ConfirmLinkBuilder,
    metrics: Arc<dyn MetricsSink>,
}

impl<M, U, O, S> AuthOrchestrator<M, U, O, S>
where
    M: TransactionManager,
    U: UserStore<Handle = M::Handle>,
    O: OutboxStore<Handle = M::Handle>,
    S: SecretProvider,
{
    pub fn new(
        coordinator: TransactionCoordinator<M>,
        user_store: U,
        publisher: OutboxPublisher<O>,
        tokens: TokenIssuer<S>,
        links: ConfirmLinkBuilder,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            coordinator,
            user_store,
            publisher,
            tokens,
            links,
            metrics,
        }
    }

    pub fn coordinator(&self) -> &TransactionCoordinator<M> {
        &self.coordinator
    }

    pub fn user_store(&self) -> &U {
        &self.user_store
    }

    pub fn register_use_case(&self) -> RegisterUseCase<'_, M, U, O> {
        RegisterUseCase::new(
            &self.coordinator,
            &self.user_store,
            &self.publisher,
            &self.links,
        )
    }

    pub fn login_use_case(&self) -> LoginUseCase<'_, M, U, O, S> {
        LoginUseCase::new(
            &self.coordinator,
            &self.user_store,
            &self.publisher,
            &self.tokens,
        )
    }

    pub fn refresh_use_case(&self) -> RefreshUseCase<'_, M, U, S> {
        RefreshUseCase::new(&self.coordinator, &self.user_store, &self.tokens)
    }

    pub fn confirm_use_case(&self) -> ConfirmUseCase<'_, M, U> {
        ConfirmUseCase::new(&self.coordinator, &self.user_store)
    }

    pub fn oauth_login_use_case(&self) -> OAuthLoginUseCase<'_, M, U, O, S> {
        OAuthLoginUseCase::new(
            &self.coordinator,
            &self.user_store,
            &self.publisher,
            &self.tokens,
            &self.links,
        )
    }

    pub fn resend_confirmation_use_case(&self) -> ResendConfirmationUseCase<'_, M, U, O> {
        ResendConfirmationUseCase::new(
            &self.coordinator,
            &self.user_store,
            &self.publisher,
            &self.links,
        )
    }

    pub fn verify_access_token_use_case(&self) -> VerifyAccessTokenUseCase<'_, S> {
        VerifyAccessTokenUseCase::new(&self.tokens)
    }

    fn observe<T>(
        &self,
        success: &'static str,
        failure: &'static str,
        result: Result<T, AuthError>,
    ) -> Result<T, AuthError> {
        match &result {
            Ok(_) => self.metrics.increment(success, 1),
            Err(AuthError::Unexpected(e)) => {
                tracing::error!(error = %e, "Authentication operation failed");
                self.metrics.increment(failure, 1);
            }
            Err(_) => self.metrics.increment(failure, 1),
        }
        result
    }
}

#[async_trait]
impl<M, U, O, S> AuthApi for AuthOrchestrator<M, U, O, S>
where
    M: TransactionManager + 'static,
    U: UserStore<Handle = M::Handle> + 'static,
    O: OutboxStore<Handle = M::Handle> + 'static,
    S: SecretProvider + 'static,
{
    async fn register(&self, email: Email, password: Password) -> Result<UserId, AuthError> {
        let result = self
            .register_use_case()
            .execute(&TxScope::root(), email, password)
            .await;
        self.observe("auth_register_success", "auth_register_failure", result)
    }

    async fn login(&self, email: Email, password: Password) -> Result<TokenPair, AuthError> {
        let result = self
            .login_use_case()
            .execute(&TxScope::root(), email, password)
            .await;
        self.observe("auth_login_success", "auth_login_failure", result)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let result = self
            .refresh_use_case()
            .execute(&TxScope::root(), refresh_token)
            .await;
        self.observe("auth_refresh_success", "auth_refresh_failure", result)
    }

    async fn confirm(&self, email: Email, register_token: &str) -> Result<(), AuthError> {
        let result = self
            .confirm_use_case()
            .execute(&TxScope::root(), email, register_token)
            .await;
        self.observe("auth_confirm_success", "auth_confirm_failure", result)
    }

    async fn oauth_login(&self, email: Email) -> Result<OAuthLogin, AuthError> {
        let result = self
            .oauth_login_use_case()
            .execute(&TxScope::root(), email)
            .await;
        self.observe("auth_oauth_login_success", "auth_oauth_login_failure", result)
    }

    async fn resend_confirmation(&self, email: Email) -> Result<(), AuthError> {
        let result = self
            .resend_confirmation_use_case()
            .execute(&TxScope::root(), email)
            .await;
        self.observe("auth_resend_success", "auth_resend_failure", result)
    }

    fn verify_access_token(&self, access_token: &str) -> Result<AccessTokenClaims, AuthError> {
        self.verify_access_token_use_case().execute(access_token)
    }
}
