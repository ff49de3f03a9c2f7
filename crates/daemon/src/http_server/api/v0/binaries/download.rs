use std::io;

use axum::body::Body;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use futures::TryStreamExt;
use http::header::CONTENT_TYPE;

use common::prelude::RecordId;
use common::transfer::encode;

use crate::auth::AuthOwner;
use crate::error::VaultError;
use crate::transfer::open_download;
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    AuthOwner(owner): AuthOwner,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, VaultError> {
    let Path(id) = path?;
    let id: RecordId = id
        .parse()
        .map_err(|_| VaultError::invalid(format!("invalid record id: {}", id)))?;

    let download = open_download(state.secrets(), &owner, id).await?;
    tracing::info!(%owner, %id, size = download.total_size, "binary download started");

    let frames = download
        .into_chunks()
        .and_then(|chunk| async move { encode(chunk).map_err(io::Error::other) });

    Ok(([(CONTENT_TYPE, "application/octet-stream")], Body::from_stream(frames)).into_response())
}
