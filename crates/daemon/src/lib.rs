// Service modules
pub mod aggregate;
pub mod auth;
pub mod blobs;
pub mod database;
pub mod error;
pub mod http_server;
pub mod process;
pub mod repository;
pub mod service_config;
pub mod service_state;
pub mod store;
pub mod transfer;

// App state (configuration, paths)
pub mod state;

pub use error::{ErrorKind, VaultError};
pub use process::{spawn_service, start_service, ShutdownHandle};
pub use service_config::Config as ServiceConfig;
pub use service_state::State as ServiceState;
pub use state::{AppConfig, AppState, StateError};
