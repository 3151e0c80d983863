use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use chrono::{DateTime, Utc};
use keystone_application::AuthApi;
use keystone_core::UserId;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use super::error::AuthApiError;

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub access_token: Secret<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct VerifyResponse {
    pub user_id: UserId,
    pub email: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[tracing::instrument(name = "Verify access token", skip_all)]
pub async fn verify<A>(
    State(api): State<Arc<A>>,
    Json(request): Json<VerifyRequest>,
) -> Result<impl IntoResponse, AuthApiError>
where
    A: AuthApi,
{
    let claims = api.verify_access_token(request.access_token.expose_secret())?;

    Ok(Json(VerifyResponse {
        expires_at: claims.expires_at(),
        user_id: claims.payload.user_id,
        email: claims.payload.email,
    }))
}
