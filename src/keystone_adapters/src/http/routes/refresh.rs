use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use keystone_application::AuthApi;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::{TokenPairResponse, error::AuthApiError};

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Secret<String>,
}

#[tracing::instrument(name = "Refresh", skip_all)]
pub async fn refresh<A>(
    State(api): State<Arc<A>>,
    Json(request): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AuthApiError>
where
    A: AuthApi,
{
    let tokens = api.refresh(request.refresh_token.expose_secret()).await?;
    Ok(Json(TokenPairResponse::from(tokens)))
}
