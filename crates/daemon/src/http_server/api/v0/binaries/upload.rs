use axum::body::Body;
use axum::extract::{Json, State};
use axum::response::IntoResponse;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use common::prelude::{CancelSignal, RecordId, UploadChunk};
use common::transfer::decode_stream;

use crate::auth::AuthOwner;
use crate::error::VaultError;
use crate::transfer::receive_upload;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub id: RecordId,
}

pub async fn handler(
    State(state): State<ServiceState>,
    AuthOwner(owner): AuthOwner,
    body: Body,
) -> Result<impl IntoResponse, VaultError> {
    let frames = decode_stream::<UploadChunk, _, _>(body.into_data_stream());

    // a client that disconnects drops this future along with the staging file
    let id = receive_upload(state.secrets(), owner, frames, CancelSignal::never()).await?;

    tracing::info!(%owner, %id, "binary uploaded");
    Ok((StatusCode::CREATED, Json(UploadResponse { id })))
}
