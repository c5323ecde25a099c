//! Profile management routed to the identity provider.

use moviedb_identity::{IdentityProvider, PASSWORD_RESET_SENT};
use moviedb_models::payload::{ChangePassword, ChangePicture, ChangeUserName, DeleteAccount};
use moviedb_models::ProviderUser;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::CatalogError;
use crate::store::Store;

#[derive(Clone)]
pub struct Accounts {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn Store>,
    admin_role: String,
}

impl Accounts {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn Store>, admin_role: impl Into<String>) -> Self {
        Self {
            identity,
            store,
            admin_role: admin_role.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.identity.provider_name()
    }

    pub async fn user_data(&self, email: &str) -> Result<Vec<ProviderUser>, CatalogError> {
        Ok(self.identity.users_by_email(email).await?)
    }

    /// True when the first role of the user registered under `email` is the
    /// admin role. Unknown emails are not admins.
    pub async fn is_admin(&self, email: &str) -> Result<bool, CatalogError> {
        let users = self.identity.users_by_email(email).await?;
        let Some(user) = users.first() else {
            debug!("No provider user for role check");
            return Ok(false);
        };

        let roles = self.identity.user_roles(&user.user_id).await?;
        Ok(roles
            .first()
            .map(|role| role.name == self.admin_role)
            .unwrap_or(false))
    }

    /// Change the nickname. When the request carries the user's email the
    /// new name is also written to their reviews; failures there are logged
    /// and do not fail the rename.
    pub async fn change_user_name(&self, change: ChangeUserName) -> Result<bool, CatalogError> {
        let updated = self
            .identity
            .set_nickname(&change.user_id, &change.user_name)
            .await?;
        let changed = updated.nickname.as_deref() == Some(change.user_name.as_str());

        if changed {
            if let Some(email) = change.email.as_deref().filter(|email| !email.is_empty()) {
                match self.store.rename_author_everywhere(email, &change.user_name).await {
                    Ok(modified) => info!(modified, "Propagated new user name to reviews"),
                    Err(e) => warn!(error = %e, "Failed to propagate new user name to reviews"),
                }
            }
        }
        Ok(changed)
    }

    pub async fn request_password_reset(&self, change: ChangePassword) -> Result<bool, CatalogError> {
        let message = self.identity.send_password_reset(&change.user_email).await?;
        Ok(message == PASSWORD_RESET_SENT)
    }

    pub async fn change_picture(&self, change: ChangePicture) -> Result<bool, CatalogError> {
        let updated = self
            .identity
            .set_picture(&change.user_id, &change.profile_pic)
            .await?;
        Ok(updated.picture.as_deref() == Some(change.profile_pic.as_str()))
    }

    pub async fn delete_account(&self, request: DeleteAccount) -> Result<bool, CatalogError> {
        self.identity.delete_user(&request.user_id).await?;
        info!("Deleted account");
        Ok(true)
    }
}
