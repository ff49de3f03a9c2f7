use axum::routing::{get, patch, post};
use axum::Router;

use common::prelude::{RecordId, SecretKind};

use crate::error::VaultError;
use crate::ServiceState;

pub mod create;
pub mod list;
pub mod list_kind;
pub mod remove;
pub mod update;

pub use create::CreateRequest;
pub use list::{ListRequest, ListResponse};
pub use list_kind::ListKindRequest;
pub use remove::RemoveRequest;
pub use update::UpdateRequest;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", post(create::handler).get(list::handler))
        .route("/:kind", get(list_kind::handler))
        .route("/:kind/:id", patch(update::handler).delete(remove::handler))
        .with_state(state)
}

fn parse_kind(raw: &str) -> Result<SecretKind, VaultError> {
    raw.parse().map_err(|e| VaultError::invalid(format!("{}", e)))
}

fn parse_id(raw: &str) -> Result<RecordId, VaultError> {
    raw.parse()
        .map_err(|_| VaultError::invalid(format!("invalid record id: {}", raw)))
}

fn secret_path(kind: SecretKind, id: RecordId) -> String {
    format!("/api/v0/secrets/{}/{}", kind, id)
}
