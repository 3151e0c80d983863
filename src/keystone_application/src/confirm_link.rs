use keystone_core::{Email, RegisterToken};
use secrecy::ExposeSecret;

/// Builds the account confirmation URL mailed to new users.
#[derive(Debug, Clone)]
pub struct ConfirmLinkBuilder {
    base_url: String,
}

impl ConfirmLinkBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn build(&self, email: &Email, token: &RegisterToken) -> String {
        format!(
            "{}/auth/confirm?email={}&register_token={}",
            self.base_url,
            urlencoding::encode(email.as_ref().expose_secret()),
            urlencoding::encode(token.as_str()),
        )
    }
}
