use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::auth::AuthService;
use crate::blobs::{BlobStore, BlobStoreError};
use crate::database::{Database, DatabaseSetupError};
use crate::store::SecretStore;
use crate::ServiceConfig;

/// Shared handles for request handlers.
#[derive(Clone)]
pub struct State(Arc<Inner>);

struct Inner {
    database: Database,
    secrets: SecretStore,
    auth: AuthService,
    aggregate_timeout: Duration,
}

impl State {
    pub async fn from_config(config: &ServiceConfig) -> Result<Self, StateSetupError> {
        let database = match &config.sqlite_path {
            Some(path) => {
                let url = Url::parse(&format!("sqlite://{}", path.display()))
                    .map_err(|e| StateSetupError::DatabaseUrl(e.to_string()))?;
                Database::connect(&url).await?
            }
            None => {
                tracing::warn!("no sqlite path configured, using an in-memory database");
                Database::in_memory().await?
            }
        };

        let blobs = BlobStore::open(&config.blobs_path).await?;
        let auth = AuthService::new(&config.jwt_secret, config.token_ttl);

        Ok(Self::new(
            SecretStore::new(database, blobs),
            auth,
            config.aggregate_timeout,
        ))
    }

    pub fn new(secrets: SecretStore, auth: AuthService, aggregate_timeout: Duration) -> Self {
        Self(Arc::new(Inner {
            database: secrets.database().clone(),
            secrets,
            auth,
            aggregate_timeout,
        }))
    }

    pub fn database(&self) -> &Database {
        &self.0.database
    }

    pub fn secrets(&self) -> &SecretStore {
        &self.0.secrets
    }

    pub fn auth(&self) -> &AuthService {
        &self.0.auth
    }

    pub fn aggregate_timeout(&self) -> Duration {
        self.0.aggregate_timeout
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("failed to setup the database: {0}")]
    Database(#[from] DatabaseSetupError),

    #[error("invalid database path: {0}")]
    DatabaseUrl(String),

    #[error("failed to setup the blob store: {0}")]
    Blobs(#[from] BlobStoreError),
}
