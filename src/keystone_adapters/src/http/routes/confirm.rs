use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use keystone_application::AuthApi;
use keystone_core::Email;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::AuthApiError;

#[derive(Deserialize)]
pub struct ConfirmQuery {
    pub email: Secret<String>,
    pub register_token: Secret<String>,
}

#[derive(Deserialize)]
pub struct ResendConfirmationRequest {
    pub email: Secret<String>,
}

#[tracing::instrument(name = "Confirm account", skip_all)]
pub async fn confirm<A>(
    State(api): State<Arc<A>>,
    Query(query): Query<ConfirmQuery>,
) -> Result<impl IntoResponse, AuthApiError>
where
    A: AuthApi,
{
    let email = Email::try_from(query.email)?;
    api.confirm(email, query.register_token.expose_secret())
        .await?;

    Ok((StatusCode::OK, String::from("Account confirmed")))
}

#[tracing::instrument(name = "Resend confirmation", skip_all)]
pub async fn resend_confirmation<A>(
    State(api): State<Arc<A>>,
    Json(request): Json<ResendConfirmationRequest>,
) -> Result<impl IntoResponse, AuthApiError>
where
    A: AuthApi,
{
    let email = Email::try_from(request.email)?;
    api.resend_confirmation(email).await?;

    Ok(StatusCode::ACCEPTED)
}
