use clap::{Args, Subcommand};

use vault_daemon::http_server::api::client::ApiError;
use vault_daemon::http_server::api::v0::auth::{LoginRequest, RegisterRequest, TokenResponse};

use crate::cli::op::{Op, OpContext};

fn token_output(action: &str, response: TokenResponse) -> String {
    format!(
        "{} {}\nexport VAULT_TOKEN={}",
        action, response.owner, response.token
    )
}

#[async_trait::async_trait]
impl Op for RegisterRequest {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let response = ctx.client.call(self.clone()).await?;
        Ok(token_output("Registered", response))
    }
}

#[async_trait::async_trait]
impl Op for LoginRequest {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let response = ctx.client.call(self.clone()).await?;
        Ok(token_output("Logged in as", response))
    }
}

crate::command_enum! {
    (Register, RegisterRequest),
    (Login, LoginRequest),
}

pub type AccountCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Account {
    #[command(subcommand)]
    pub command: AccountCommand,
}

#[async_trait::async_trait]
impl Op for Account {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
