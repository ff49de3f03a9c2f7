use clap::Args;

use common::prelude::{RecordId, SecretKind, SecretPatch, ValidationError};
use vault_daemon::http_server::api::client::ApiError;
use vault_daemon::http_server::api::v0::secrets::UpdateRequest;

use crate::cli::op::{Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Update {
    #[arg(long)]
    pub kind: SecretKind,

    #[arg(long)]
    pub id: RecordId,

    /// Fields to change as a JSON object, e.g. '{"password":"hunter2"}'
    #[arg(long)]
    pub patch: String,
}

#[async_trait::async_trait]
impl Op for Update {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let value: serde_json::Value = serde_json::from_str(&self.patch)
            .map_err(|e| ValidationError::malformed("patch", e.to_string()))?;
        let patch = SecretPatch::from_value(self.kind, value)
            .map_err(|e| ValidationError::malformed("patch", e.to_string()))?;
        patch.validate()?;

        let response = ctx
            .client
            .call(UpdateRequest { id: self.id, patch })
            .await?;
        Ok(format!("Updated {} {}", response.kind, response.id))
    }
}
