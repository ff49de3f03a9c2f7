pub mod account;
pub mod daemon;
pub mod health;
pub mod init;
pub mod secret;
pub mod version;

pub use account::Account;
pub use daemon::Daemon;
pub use health::Health;
pub use init::Init;
pub use secret::Secret;
pub use version::Version;
