use axum::extract::rejection::PathRejection;
use axum::extract::{Json, Path, State};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

use common::prelude::{RecordId, SecretKind};

use super::{parse_id, parse_kind, secret_path};
use crate::auth::AuthOwner;
use crate::error::VaultError;
use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct RemoveRequest {
    /// Kind of the secret (credential, note, binary, card)
    #[arg(long)]
    pub kind: SecretKind,
    /// Id of the secret within its kind
    #[arg(long)]
    pub id: RecordId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveResponse {
    pub id: RecordId,
    pub kind: SecretKind,
}

pub async fn handler(
    State(state): State<ServiceState>,
    AuthOwner(owner): AuthOwner,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<Json<RemoveResponse>, VaultError> {
    let Path((kind, id)) = path?;
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id)?;

    state.secrets().remove(&owner, kind, id).await?;

    tracing::info!(%owner, %kind, %id, "secret removed");
    Ok(Json(RemoveResponse { id, kind }))
}

impl ApiRequest for RemoveRequest {
    type Response = RemoveResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join(&secret_path(self.kind, self.id))?;
        Ok(client.delete(full_url))
    }
}
