use chrono::{DateTime, Duration, Utc};
use subtle::ConstantTimeEq;

use super::random::generate_random_string;

pub const REFRESH_TOKEN_LENGTH: usize = 255;

/// Opaque, stored credential exchanged for a new token pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn new(ttl: Duration) -> Self {
        Self {
            token: generate_random_string(REFRESH_TOKEN_LENGTH),
            expires_at: Utc::now() + ttl,
        }
    }

    /// Rebuild a token loaded from storage.
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

    /// Constant-time comparison against a presented value.
    pub fn matches(&self, candidate: &str) -> bool {
        self.token.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}
