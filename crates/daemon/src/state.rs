use std::path::PathBuf;
use std::{fs, time::Duration};

use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "vault";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DB_FILE_NAME: &str = "db.sqlite";
pub const JWT_SECRET_FILE_NAME: &str = "jwt.secret";
pub const BLOBS_DIR_NAME: &str = "blobs";

const JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the API server
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Default tracing directive; `RUST_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for rolling log files (stdout only if unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Lifetime of issued bearer tokens
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    /// Upper bound on a cross-kind listing
    #[serde(default = "default_aggregate_timeout_secs")]
    pub aggregate_timeout_secs: u64,
}

fn default_api_port() -> u16 {
    5050
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_token_ttl_secs() -> u64 {
    3600
}

fn default_aggregate_timeout_secs() -> u64 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            log_level: default_log_level(),
            log_dir: None,
            token_ttl_secs: default_token_ttl_secs(),
            aggregate_timeout_secs: default_aggregate_timeout_secs(),
        }
    }
}

impl AppConfig {
    pub fn log_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn aggregate_timeout(&self) -> Duration {
        Duration::from_secs(self.aggregate_timeout_secs)
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the vault directory (~/.vault)
    pub vault_dir: PathBuf,
    /// Path to the SQLite database
    pub db_path: PathBuf,
    /// Path to the token signing key
    pub jwt_secret_path: PathBuf,
    /// Path to the blobs directory
    pub blobs_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the vault directory path (custom or default ~/.vault)
    pub fn vault_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    fn layout(vault_dir: PathBuf, config: AppConfig) -> Self {
        Self {
            db_path: vault_dir.join(DB_FILE_NAME),
            jwt_secret_path: vault_dir.join(JWT_SECRET_FILE_NAME),
            blobs_path: vault_dir.join(BLOBS_DIR_NAME),
            config_path: vault_dir.join(CONFIG_FILE_NAME),
            vault_dir,
            config,
        }
    }

    /// Initialize a new vault directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let vault_dir = Self::vault_dir(custom_path)?;
        if vault_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        let state = Self::layout(vault_dir, config.unwrap_or_default());

        fs::create_dir_all(&state.vault_dir)?;
        fs::create_dir_all(&state.blobs_path)?;

        let secret: [u8; JWT_SECRET_LEN] = rand::random();
        fs::write(&state.jwt_secret_path, hex::encode(secret))?;

        let config_toml = toml::to_string_pretty(&state.config)?;
        fs::write(&state.config_path, config_toml)?;

        // the service creates and migrates the schema on first start
        fs::write(&state.db_path, "")?;

        Ok(state)
    }

    /// Load existing state from the vault directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let vault_dir = Self::vault_dir(custom_path)?;
        if !vault_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = vault_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }
        let config: AppConfig = toml::from_str(&fs::read_to_string(&config_path)?)?;

        let state = Self::layout(vault_dir, config);
        if !state.db_path.exists() {
            return Err(StateError::MissingFile(DB_FILE_NAME.to_string()));
        }
        if !state.jwt_secret_path.exists() {
            return Err(StateError::MissingFile(JWT_SECRET_FILE_NAME.to_string()));
        }
        if !state.blobs_path.exists() {
            return Err(StateError::MissingFile(format!("{}/", BLOBS_DIR_NAME)));
        }

        Ok(state)
    }

    /// Load the token signing key
    pub fn load_jwt_secret(&self) -> Result<Vec<u8>, StateError> {
        let encoded = fs::read_to_string(&self.jwt_secret_path)?;
        let secret =
            hex::decode(encoded.trim()).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        if secret.len() < JWT_SECRET_LEN {
            return Err(StateError::InvalidKey(format!(
                "expected at least {} bytes",
                JWT_SECRET_LEN
            )));
        }
        Ok(secret)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("vault directory not initialized. Run 'vault init' first")]
    NotInitialized,

    #[error("vault directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault");

        let created = AppState::init(Some(path.clone()), None).unwrap();
        assert_eq!(created.config, AppConfig::default());

        let loaded = AppState::load(Some(path.clone())).unwrap();
        assert_eq!(loaded.config.api_port, 5050);
        assert_eq!(loaded.load_jwt_secret().unwrap().len(), 32);

        assert!(matches!(
            AppState::init(Some(path), None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_requires_init() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppState::load(Some(dir.path().join("missing"))),
            Err(StateError::NotInitialized)
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str("api_port = 6000").unwrap();
        assert_eq!(config.api_port, 6000);
        assert_eq!(config.token_ttl_secs, 3600);
        assert_eq!(config.log_level(), tracing::Level::INFO);
    }
}
