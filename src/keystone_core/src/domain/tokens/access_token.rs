use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::user::UserId;

pub const ISSUER: &str = "keystone-auth-service";

#[derive(Debug, Error)]
pub enum AccessTokenError {
    #[error("access token expired")]
    Expired,
    #[error("invalid access token: {0}")]
    Invalid(String),
    #[error("failed to sign access token: {0}")]
    Signing(String),
}

/// Identity carried inside an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenPayload {
    pub user_id: UserId,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(flatten)]
    pub payload: AccessTokenPayload,
}

impl AccessTokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Signed, self-contained credential. Never persisted.
#[derive(Debug, Clone)]
pub struct AccessToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(
        ttl: Duration,
        signing_key: &[u8],
        payload: AccessTokenPayload,
    ) -> Result<Self, AccessTokenError> {
        let issued_at = Utc::now();
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| AccessTokenError::Signing("ttl out of range".to_string()))?;

        let claims = AccessTokenClaims {
            iss: ISSUER.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            payload,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(signing_key),
        )
        .map_err(|e| AccessTokenError::Signing(e.to_string()))?;

        Ok(Self { token, expires_at })
    }

    /// Check signature, algorithm, issuer and expiry of `token`.
    pub fn verify(token: &str, signing_key: &[u8]) -> Result<AccessTokenClaims, AccessTokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.leeway = 0;

        decode::<AccessTokenClaims>(token, &DecodingKey::from_secret(signing_key), &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AccessTokenError::Expired,
                _ => AccessTokenError::Invalid(e.to_string()),
            })
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}
