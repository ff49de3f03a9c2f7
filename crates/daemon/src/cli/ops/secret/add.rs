use clap::{Args, Subcommand};

use common::prelude::{Card, Credential, Note, SecretData};
use vault_daemon::http_server::api::client::ApiError;
use vault_daemon::http_server::api::v0::secrets::CreateRequest;

use crate::cli::op::{Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct AddCredential {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub login: String,
    #[arg(long)]
    pub password: String,
    #[arg(long, default_value = "")]
    pub website: String,
    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(Args, Debug, Clone)]
pub struct AddNote {
    #[arg(long)]
    pub name: String,
    /// Note text
    #[arg(long)]
    pub body: String,
}

#[derive(Args, Debug, Clone)]
pub struct AddCard {
    #[arg(long)]
    pub name: String,
    /// Card number, digits only
    #[arg(long)]
    pub number: String,
    /// Expiration as MM/YY
    #[arg(long)]
    pub expiration: String,
    #[arg(long)]
    pub cvv: String,
    /// Cardholder name as printed
    #[arg(long)]
    pub holder: String,
    #[arg(long, default_value = "")]
    pub notes: String,
}

async fn create(ctx: &OpContext, name: &str, data: SecretData) -> Result<String, ApiError> {
    data.validate(name)?;
    let response = ctx
        .client
        .call(CreateRequest {
            name: name.to_string(),
            data,
        })
        .await?;
    Ok(format!("Created {} {}", response.kind, response.id))
}

#[async_trait::async_trait]
impl Op for AddCredential {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let data = SecretData::Credential(Credential {
            login: self.login.clone(),
            password: self.password.clone(),
            website: self.website.clone(),
            notes: self.notes.clone(),
        });
        create(ctx, &self.name, data).await
    }
}

#[async_trait::async_trait]
impl Op for AddNote {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let data = SecretData::Note(Note {
            body: self.body.clone(),
        });
        create(ctx, &self.name, data).await
    }
}

#[async_trait::async_trait]
impl Op for AddCard {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let data = SecretData::Card(Card {
            number: self.number.clone(),
            expiration: self.expiration.clone(),
            cvv: self.cvv.clone(),
            holder: self.holder.clone(),
            notes: self.notes.clone(),
        });
        create(ctx, &self.name, data).await
    }
}

crate::command_enum! {
    (Credential, AddCredential),
    (Note, AddNote),
    (Card, AddCard),
}

/// Add a credential, note or card. Files go through `secret upload`.
#[derive(Args, Debug, Clone)]
pub struct Add {
    #[command(subcommand)]
    pub command: Command,
}

#[async_trait::async_trait]
impl Op for Add {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
