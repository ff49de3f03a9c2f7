use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

use super::TokenResponse;
use crate::error::VaultError;
use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct LoginRequest {
    #[arg(long)]
    pub login: String,
    #[arg(long)]
    pub password: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, VaultError> {
    let Json(req) = payload?;
    let (owner, token) = state
        .auth()
        .login(state.database(), &req.login, &req.password)
        .await?;

    tracing::debug!(%owner, "token issued");
    Ok(Json(TokenResponse { owner, token }))
}

impl ApiRequest for LoginRequest {
    type Response = TokenResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/api/v0/auth/login")?;
        Ok(client.post(full_url).json(&self))
    }
}
