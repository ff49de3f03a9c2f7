use clap::Args;

use common::prelude::{Secret, SecretKind, SecretRecord};
use vault_daemon::http_server::api::client::ApiError;
use vault_daemon::http_server::api::v0::secrets::{ListKindRequest, ListRequest};

use crate::cli::op::{Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Only list one kind (credential, note, binary, card)
    #[arg(long)]
    pub kind: Option<SecretKind>,

    /// Query each kind separately and merge locally
    #[arg(long, conflicts_with = "kind")]
    pub per_kind: bool,

    /// Print the records as JSON, secret fields included
    #[arg(long)]
    pub json: bool,
}

#[async_trait::async_trait]
impl Op for Ls {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let mut records = match self.kind {
            Some(kind) => ctx.client.call(ListKindRequest { kind }).await?.secrets,
            None if self.per_kind => ctx.client.fetch_all(ctx.interrupt()).await?,
            None => ctx.client.call(ListRequest).await?.secrets,
        };
        records.sort_by_key(|r| (r.kind(), r.id()));

        if self.json {
            return serde_json::to_string_pretty(&records)
                .map_err(|e| ApiError::Io(std::io::Error::other(e)));
        }
        if records.is_empty() {
            return Ok("No secrets found".to_string());
        }
        Ok(records.iter().map(summary).collect::<Vec<_>>().join("\n"))
    }
}

fn summary(record: &SecretRecord) -> String {
    let detail = match record {
        SecretRecord::Credential(Secret { data, .. }) if data.website.is_empty() => {
            data.login.clone()
        }
        SecretRecord::Credential(Secret { data, .. }) => {
            format!("{} @ {}", data.login, data.website)
        }
        SecretRecord::Note(Secret { data, .. }) => {
            data.body.lines().next().unwrap_or_default().to_string()
        }
        SecretRecord::Binary(Secret { data, .. }) => {
            format!("{} ({} bytes)", data.filename, data.size)
        }
        SecretRecord::Card(Secret { data, .. }) => {
            let tail = data.number.len().saturating_sub(4);
            format!("**** {} exp {}", &data.number[tail..], data.expiration)
        }
    };
    format!(
        "{:<10} {:>6}  {}  {}",
        record.kind(),
        record.id(),
        record.name(),
        detail
    )
}
