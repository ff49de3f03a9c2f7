use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    /// Port for the API HTTP server
    pub api_port: u16,

    // data store configuration
    /// a path to a sqlite database, if not set then an
    ///  in-memory database will be used
    pub sqlite_path: Option<PathBuf>,
    /// Root of the blob store (content + staging)
    pub blobs_path: PathBuf,

    // identity
    /// HS256 signing key for bearer tokens
    pub jwt_secret: Vec<u8>,
    pub token_ttl: Duration,

    /// Upper bound on a cross-kind listing
    pub aggregate_timeout: Duration,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}
