use clap::{Args, Subcommand};

pub mod add;
pub mod download;
pub mod ls;
pub mod update;
pub mod upload;

use vault_daemon::http_server::api::client::ApiError;
use vault_daemon::http_server::api::v0::secrets::RemoveRequest;

use crate::cli::op::{Op, OpContext};

#[async_trait::async_trait]
impl Op for RemoveRequest {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let response = ctx.client.call(self.clone()).await?;
        Ok(format!("Removed {} {}", response.kind, response.id))
    }
}

crate::command_enum! {
    (Add, add::Add),
    (Ls, ls::Ls),
    (Update, update::Update),
    (Rm, RemoveRequest),
    (Upload, upload::Upload),
    (Download, download::Download),
}

pub type SecretCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Secret {
    #[command(subcommand)]
    pub command: SecretCommand,
}

#[async_trait::async_trait]
impl Op for Secret {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
