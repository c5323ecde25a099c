use async_trait::async_trait;
use moviedb_models::{ProviderUser, Role};

use crate::error::IdentityError;

/// Management operations on the external user directory.
///
/// `user_id` arguments are provider-local ids (the part after `|`) or full
/// `connection|id` ids; implementations address the user accordingly.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn users_by_email(&self, email: &str) -> Result<Vec<ProviderUser>, IdentityError>;

    /// Returns the updated user record.
    async fn set_nickname(&self, user_id: &str, nickname: &str) -> Result<ProviderUser, IdentityError>;

    /// Returns the updated user record.
    async fn set_picture(&self, user_id: &str, picture_url: &str) -> Result<ProviderUser, IdentityError>;

    async fn delete_user(&self, user_id: &str) -> Result<(), IdentityError>;

    async fn user_roles(&self, user_id: &str) -> Result<Vec<Role>, IdentityError>;

    /// Ask the provider to email a password reset link. Returns the
    /// provider's confirmation message.
    async fn send_password_reset(&self, email: &str) -> Result<String, IdentityError>;
}
