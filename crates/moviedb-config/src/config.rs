use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::credentials::CredentialStore;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Page size used when a listing request does not ask for one.
    #[serde(default = "default_movies_per_page")]
    pub movies_per_page: u32,
    /// Empty means any origin.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_uri")]
    pub uri: String,
    /// Database name holding the movies, reviews and movie_requests collections
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Tenant base URL, e.g. https://moviedb.us.auth0.com
    #[serde(default)]
    pub base_url: String,
    /// Machine-to-machine application used for the management API
    #[serde(default)]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    /// Frontend application id, required by the password reset endpoint
    #[serde(default)]
    pub app_client_id: String,
    #[serde(default = "default_connection")]
    pub connection: String,
    #[serde(default = "default_admin_role")]
    pub admin_role: String,
    #[serde(default = "default_user_id_prefix")]
    pub user_id_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Force JSON (true) or plain (false) output; unset means JSON when stdout is not a terminal
    #[serde(default)]
    pub json: Option<bool>,
    pub file: Option<PathBuf>,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_api_prefix() -> String {
    "/api/v1/movies".to_string()
}

fn default_movies_per_page() -> u32 {
    21
}

fn default_database_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_namespace() -> String {
    "sample_mflix".to_string()
}

fn default_pool_size() -> u32 {
    25
}

fn default_write_timeout_ms() -> u64 {
    2500
}

fn default_connection() -> String {
    "Username-Password-Authentication".to_string()
}

fn default_admin_role() -> String {
    "MovieDB Admin".to_string()
}

fn default_user_id_prefix() -> String {
    "auth0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            api_prefix: default_api_prefix(),
            movies_per_page: default_movies_per_page(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: default_database_uri(),
            namespace: default_namespace(),
            pool_size: default_pool_size(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            app_client_id: String::new(),
            connection: default_connection(),
            admin_role: default_admin_role(),
            user_id_prefix: default_user_id_prefix(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: None,
            file: None,
        }
    }
}

impl IdentityConfig {
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve the effective configuration: file (or defaults when it does
    /// not exist), then secrets from the credentials file, then environment
    /// variables, then validation.
    pub fn load(config_file: &Path, credentials_file: &Path) -> anyhow::Result<Self> {
        let mut config = if config_file.exists() {
            info!(path = %config_file.display(), "Loading configuration");
            Self::load_from_file(config_file)?
        } else {
            debug!(path = %config_file.display(), "No configuration file, using defaults");
            Self::default()
        };

        let credentials = CredentialStore::load(credentials_file)?;
        if !credentials.is_empty() {
            debug!(path = %credentials_file.display(), "Applying credentials");
        }
        config.apply_credentials(&credentials);

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_credentials(&mut self, credentials: &CredentialStore) {
        if let Some(secret) = &credentials.identity_client_secret {
            self.identity.client_secret = secret.clone();
        }
        if let Some(uri) = &credentials.database_uri {
            self.database.uri = uri.clone();
        }
    }

    /// Apply the deployment environment variables. `lookup` is
    /// `std::env::var` outside of tests.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(uri) = var("MOVIEREVIEWS_DB_URI") {
            self.database.uri = uri;
        }
        if let Some(namespace) = var("MOVIEREVIEWS_NS") {
            self.database.namespace = namespace;
        }
        if let Some(port) = var("PORT") {
            match port.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(e) => tracing::warn!("Ignoring invalid PORT value '{}': {}", port, e),
            }
        }
        if let Some(bind) = var("MOVIEDB_BIND") {
            self.server.bind = bind;
        }
        if let Some(base) = var("AUTH0_BASE") {
            self.identity.base_url = base;
        }
        if let Some(client_id) = var("CLIENT_ID") {
            self.identity.client_id = client_id;
        }
        if let Some(secret) = var("CLIENT") {
            self.identity.client_secret = secret;
        }
        if let Some(app_client_id) = var("MOVIEDB_CLIENT_ID") {
            self.identity.app_client_id = app_client_id;
        }
        if let Some(role) = var("MOVIEDB_ADMIN_ROLE") {
            self.identity.admin_role = role;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.server.api_prefix.starts_with('/') {
            return Err(anyhow::anyhow!("server.api_prefix must start with '/'"));
        }
        if self.server.movies_per_page == 0 {
            return Err(anyhow::anyhow!("server.movies_per_page must be greater than zero"));
        }
        if !(self.database.uri.starts_with("mongodb://") || self.database.uri.starts_with("mongodb+srv://")) {
            return Err(anyhow::anyhow!("database.uri must be a mongodb:// or mongodb+srv:// connection string"));
        }
        if self.database.namespace.trim().is_empty() {
            return Err(anyhow::anyhow!("database.namespace cannot be empty"));
        }
        if self.database.pool_size == 0 {
            return Err(anyhow::anyhow!("database.pool_size must be greater than zero"));
        }

        // Identity settings are optional, but a half-filled block is a mistake
        let identity = &self.identity;
        if !identity.base_url.is_empty() {
            if !(identity.base_url.starts_with("https://") || identity.base_url.starts_with("http://")) {
                return Err(anyhow::anyhow!("identity.base_url must be an http(s) URL"));
            }
            if identity.client_id.is_empty() {
                return Err(anyhow::anyhow!("identity.base_url is set but identity.client_id is not configured"));
            }
            if identity.client_secret.is_empty() {
                return Err(anyhow::anyhow!("identity.base_url is set but the client secret is not configured"));
            }
        }
        if identity.admin_role.trim().is_empty() {
            return Err(anyhow::anyhow!("identity.admin_role cannot be empty"));
        }

        Ok(())
    }
}
