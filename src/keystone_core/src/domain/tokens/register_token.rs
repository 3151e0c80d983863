use chrono::{DateTime, Duration, Utc};
use subtle::ConstantTimeEq;

use super::random::generate_random_string;

pub const REGISTER_TOKEN_LENGTH: usize = 25;

pub fn register_token_ttl() -> Duration {
    Duration::hours(24)
}

/// Opaque, single-purpose credential that confirms an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl RegisterToken {
    pub fn new() -> Self {
        Self {
            token: generate_random_string(REGISTER_TOKEN_LENGTH),
            expires_at: Utc::now() + register_token_ttl(),
        }
    }

    pub fn restore(token: String, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.expires_at > Utc::now()
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.token.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl Default for RegisterToken {
    fn default() -> Self {
        Self::new()
    }
}
