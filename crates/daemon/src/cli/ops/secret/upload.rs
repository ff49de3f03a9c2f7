use std::path::PathBuf;

use clap::Args;

use vault_daemon::http_server::api::client::ApiError;

use crate::cli::op::{Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Upload {
    /// Local file to store
    #[arg(long)]
    pub file: PathBuf,

    /// Secret name (defaults to the file name)
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, default_value = "")]
    pub notes: String,
}

#[async_trait::async_trait]
impl Op for Upload {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let name = match &self.name {
            Some(name) => name.clone(),
            None => self
                .file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        let id = ctx
            .client
            .upload_file(&self.file, &name, &self.notes, ctx.interrupt())
            .await?;
        Ok(format!("Uploaded {} as binary {}", self.file.display(), id))
    }
}
