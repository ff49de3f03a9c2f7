use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::IntoResponse;
use http::StatusCode;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

use super::TokenResponse;
use crate::error::VaultError;
use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct RegisterRequest {
    /// Login for the new account
    #[arg(long)]
    pub login: String,
    /// Password for the new account
    #[arg(long)]
    pub password: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, VaultError> {
    let Json(req) = payload?;
    let (owner, token) = state
        .auth()
        .register(state.database(), &req.login, &req.password)
        .await?;

    Ok((StatusCode::CREATED, Json(TokenResponse { owner, token })))
}

impl ApiRequest for RegisterRequest {
    type Response = TokenResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/api/v0/auth/register")?;
        Ok(client.post(full_url).json(&self))
    }
}
