use keystone_core::{AccessToken, AccessTokenClaims, SecretProvider, TokenPair, TokenPolicy, User};
use secrecy::ExposeSecret;

use crate::error::AuthError;

/// Rotates a user's credentials with the current signing key.
pub struct TokenIssuer<S> {
    policy: TokenPolicy,
    secrets: S,
}

impl<S: SecretProvider> TokenIssuer<S> {
    pub fn new(policy: TokenPolicy, secrets: S) -> Self {
        Self { policy, secrets }
    }

    pub fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    pub fn issue(&self, user: &mut User) -> Result<TokenPair, AuthError> {
        let signing_key = self.secrets.signing_key();
        Ok(user.rotate_tokens(&self.policy, &signing_key)?)
    }

    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, AuthError> {
        let signing_key = self.secrets.signing_key();
        Ok(AccessToken::verify(
            token,
            signing_key.expose_secret().as_bytes(),
        )?)
    }
}
