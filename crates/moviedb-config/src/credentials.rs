use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Secrets kept out of `config.toml`: the management API client secret and
/// a database URI that embeds a password.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialStore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_uri: Option<String>,
}

impl CredentialStore {
    /// A missing file holds no secrets.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let store = toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(store)
    }

    /// Write the file readable by the owner only.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.identity_client_secret.is_none() && self.database_uri.is_none()
    }
}
