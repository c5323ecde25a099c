pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{Config, DatabaseConfig, IdentityConfig, LoggingConfig, ServerConfig};
pub use credentials::CredentialStore;
pub use paths::{PathManager, container_base_path};
