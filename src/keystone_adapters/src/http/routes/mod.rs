pub mod confirm;
pub mod error;
pub mod health;
pub mod login;
pub mod metrics;
pub mod refresh;
pub mod register;
pub mod verify;

pub use confirm::{confirm, resend_confirmation};
pub use error::{AuthApiError, ErrorResponse};
pub use health::health;
pub use login::login;
pub use metrics::{metrics, track_requests};
pub use refresh::refresh;
pub use register::register;
pub use verify::verify;

use keystone_core::TokenPair;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(tokens: TokenPair) -> Self {
        Self {
            access_token: tokens.access_token.as_str().to_string(),
            refresh_token: tokens.refresh_token.as_str().to_string(),
        }
    }
}
