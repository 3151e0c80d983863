use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use keystone_application::AuthApi;
use keystone_core::{Email, Password};
use secrecy::Secret;
use serde::Deserialize;

use super::{TokenPairResponse, error::AuthApiError};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Secret<String>,
    pub password: Secret<String>,
}

#[tracing::instrument(name = "Login", skip_all)]
pub async fn login<A>(
    State(api): State<Arc<A>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthApiError>
where
    A: AuthApi,
{
    let email = Email::try_from(request.email)?;
    let password = Password::try_from(request.password)?;

    let tokens = api.login(email, password).await?;

    Ok(Json(TokenPairResponse::from(tokens)))
}
