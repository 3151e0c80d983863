use keystone_core::{AccessTokenClaims, SecretProvider};

use crate::{error::AuthError, token_issuer::TokenIssuer};

/// Verify access token use case - stateless check of a presented JWT
pub struct VerifyAccessTokenUseCase<'a, S> {
    tokens: &'a TokenIssuer<S>,
}

impl<'a, S: SecretProvider> VerifyAccessTokenUseCase<'a, S> {
    pub fn new(tokens: &'a TokenIssuer<S>) -> Self {
        Self { tokens }
    }

    #[tracing::instrument(name = "VerifyAccessTokenUseCase::execute", skip_all)]
    pub fn execute(&self, access_token: &str) -> Result<AccessTokenClaims, AuthError> {
        self.tokens.verify(access_token)
    }
}
