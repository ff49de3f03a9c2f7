use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Json, Path, State};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

use common::prelude::{RecordId, SecretKind, SecretPatch};

use super::{parse_id, parse_kind, secret_path};
use crate::auth::AuthOwner;
use crate::error::VaultError;
use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::ServiceState;

/// Client side of an update. The kind travels in the path, the patch
/// fields in the body.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub id: RecordId,
    pub patch: SecretPatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub id: RecordId,
    pub kind: SecretKind,
}

pub async fn handler(
    State(state): State<ServiceState>,
    AuthOwner(owner): AuthOwner,
    path: Result<Path<(String, String)>, PathRejection>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<UpdateResponse>, VaultError> {
    let Path((kind, id)) = path?;
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id)?;
    let Json(body) = payload?;

    let patch = SecretPatch::from_value(kind, body)
        .map_err(|e| VaultError::invalid(format!("malformed {} patch: {}", kind, e)))?;
    state.secrets().update(&owner, id, patch).await?;

    tracing::info!(%owner, %kind, %id, "secret updated");
    Ok(Json(UpdateResponse { id, kind }))
}

impl ApiRequest for UpdateRequest {
    type Response = UpdateResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join(&secret_path(self.patch.kind(), self.id))?;
        Ok(client.patch(full_url).json(&self.patch))
    }
}
