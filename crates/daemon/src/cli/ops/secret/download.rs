use std::path::PathBuf;

use clap::Args;

use common::prelude::{RecordId, SecretKind, SecretRecord};
use vault_daemon::http_server::api::client::ApiError;
use vault_daemon::http_server::api::v0::secrets::ListKindRequest;

use crate::cli::op::{Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Download {
    #[arg(long)]
    pub id: RecordId,

    /// Destination path (defaults to the stored file name in the current directory)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[async_trait::async_trait]
impl Op for Download {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let out = match &self.out {
            Some(out) => out.clone(),
            None => stored_filename(ctx, self.id).await?,
        };

        let summary = ctx
            .client
            .download_file(self.id, &out, ctx.interrupt())
            .await?;
        Ok(format!(
            "Downloaded binary {} to {} ({} bytes)",
            self.id,
            summary.path.display(),
            summary.bytes
        ))
    }
}

/// File name recorded at upload, reduced to its last component.
async fn stored_filename(ctx: &OpContext, id: RecordId) -> Result<PathBuf, ApiError> {
    let binaries = ctx
        .client
        .call(ListKindRequest {
            kind: SecretKind::Binary,
        })
        .await?
        .secrets;

    binaries
        .into_iter()
        .find_map(|record| match record {
            SecretRecord::Binary(secret) if secret.id == id => {
                PathBuf::from(&secret.data.filename)
                    .file_name()
                    .map(PathBuf::from)
            }
            _ => None,
        })
        .ok_or_else(|| ApiError::Status {
            status: reqwest::StatusCode::NOT_FOUND,
            kind: vault_daemon::ErrorKind::NotFound,
            message: format!("no binary secret with id {}", id),
        })
}
