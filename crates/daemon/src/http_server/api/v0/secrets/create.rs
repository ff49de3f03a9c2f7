use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::IntoResponse;
use http::StatusCode;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

use common::prelude::{RecordId, SecretData, SecretKind};

use crate::auth::AuthOwner;
use crate::error::VaultError;
use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRequest {
    pub name: String,
    #[serde(flatten)]
    pub data: SecretData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResponse {
    pub id: RecordId,
    pub kind: SecretKind,
}

pub async fn handler(
    State(state): State<ServiceState>,
    AuthOwner(owner): AuthOwner,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, VaultError> {
    let Json(req) = payload?;
    let kind = req.data.kind();
    let id = state.secrets().create(&owner, &req.name, &req.data).await?;

    tracing::info!(%owner, %kind, %id, "secret created");
    Ok((StatusCode::CREATED, Json(CreateResponse { id, kind })))
}

impl ApiRequest for CreateRequest {
    type Response = CreateResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/api/v0/secrets")?;
        Ok(client.post(full_url).json(&self))
    }
}
