pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "vault")]
#[command(about = "Personal secret vault: credentials, notes, cards and files")]
pub struct Args {
    /// API server URL (defaults to localhost on the configured api_port)
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Path to the vault directory (defaults to ~/.vault)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Bearer token from `vault account login`
    #[arg(long, global = true, env = "VAULT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: crate::Command,
}
