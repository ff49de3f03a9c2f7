use axum::extract::rejection::PathRejection;
use axum::extract::{Json, Path, State};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

use common::prelude::SecretKind;

use super::list::ListResponse;
use super::parse_kind;
use crate::auth::AuthOwner;
use crate::error::VaultError;
use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListKindRequest {
    pub kind: SecretKind,
}

pub async fn handler(
    State(state): State<ServiceState>,
    AuthOwner(owner): AuthOwner,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<ListResponse>, VaultError> {
    let Path(kind) = path?;
    let kind = parse_kind(&kind)?;
    let secrets = state.secrets().get_all(&owner, kind).await?;
    Ok(Json(ListResponse { secrets }))
}

impl ApiRequest for ListKindRequest {
    type Response = ListResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join(&format!("/api/v0/secrets/{}", self.kind))?;
        Ok(client.get(full_url))
    }
}
