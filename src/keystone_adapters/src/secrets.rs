use keystone_core::SecretProvider;
use secrecy::Secret;

/// Signing key fixed at startup, typically read from configuration.
#[derive(Clone)]
pub struct StaticSecretProvider {
    signing_key: Secret<String>,
}

impl StaticSecretProvider {
    pub fn new(signing_key: Secret<String>) -> Self {
        Self { signing_key }
    }
}

impl SecretProvider for StaticSecretProvider {
    fn signing_key(&self) -> Secret<String> {
        self.signing_key.clone()
    }
}
