pub mod access_token;
pub mod random;
pub mod refresh_token;
pub mod register_token;

use chrono::Duration;

pub use access_token::{
    AccessToken, AccessTokenClaims, AccessTokenError, AccessTokenPayload, ISSUER,
};
pub use random::generate_random_string;
pub use refresh_token::RefreshToken;
pub use register_token::RegisterToken;

/// Lifetimes applied when a new token pair is issued.
#[derive(Debug, Clone, Copy)]
pub struct TokenPolicy {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(30),
        }
    }
}

/// Freshly rotated credentials handed back to the caller.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}
