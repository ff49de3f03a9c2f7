use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use common::prelude::RecordId;

use crate::ServiceState;

pub mod download;
pub mod upload;

pub use upload::UploadResponse;

pub const UPLOAD_PATH: &str = "/api/v0/binaries";

pub fn download_path(id: RecordId) -> String {
    format!("/api/v0/binaries/{}/content", id)
}

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        // the content streams through in bounded chunks
        .route("/", post(upload::handler).layer(DefaultBodyLimit::disable()))
        .route("/:id/content", get(download::handler))
        .with_state(state)
}
