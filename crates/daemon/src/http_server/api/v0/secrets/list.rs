use axum::extract::{Json, State};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

use common::prelude::{Deadline, SecretRecord};

use crate::auth::AuthOwner;
use crate::error::VaultError;
use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::ServiceState;

/// Every record the caller owns, across all kinds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub secrets: Vec<SecretRecord>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    AuthOwner(owner): AuthOwner,
) -> Result<Json<ListResponse>, VaultError> {
    // dropping this future (client gone) aborts the per-kind producers too
    let deadline = Deadline::after(state.aggregate_timeout());
    let secrets = state.secrets().list_all(owner, deadline.signal()).await?;
    Ok(Json(ListResponse { secrets }))
}

impl ApiRequest for ListRequest {
    type Response = ListResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/api/v0/secrets")?;
        Ok(client.get(full_url))
    }
}
