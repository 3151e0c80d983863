use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use keystone_application::AuthApi;
use keystone_core::{Email, Password, UserId};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use super::error::AuthApiError;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: Secret<String>,
    pub password: Secret<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub user_id: UserId,
    pub email: String,
}

#[tracing::instrument(name = "Register", skip_all)]
pub async fn register<A>(
    State(api): State<Arc<A>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthApiError>
where
    A: AuthApi,
{
    let email = Email::try_from(request.email)?;
    let password = Password::try_from(request.password)?;

    let user_id = api.register(email.clone(), password).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id,
            email: email.as_ref().expose_secret().clone(),
        }),
    ))
}
