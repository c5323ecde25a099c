use async_trait::async_trait;
use moviedb_models::{ProviderUser, Role};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::IdentityError;
use crate::traits::IdentityProvider;
use crate::PASSWORD_RESET_SENT;

const DEFAULT_CONNECTION: &str = "auth0";

/// User directory held in memory, used by `serve --in-memory` and tests.
///
/// Users are addressed the same way as with Auth0: a bare id is read as
/// `auth0|id`, a full `connection|id` is used as given.
#[derive(Default)]
pub struct InMemoryDirectory {
    users: RwLock<Vec<ProviderUser>>,
    roles: RwLock<HashMap<String, Vec<Role>>>,
    resets: RwLock<Vec<String>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, user: ProviderUser) {
        self.users.write().await.push(user);
    }

    pub async fn grant_role(&self, user_id: &str, role: Role) {
        self.roles
            .write()
            .await
            .entry(full_id(user_id))
            .or_default()
            .push(role);
    }

    /// Emails a password reset was requested for, oldest first.
    pub async fn password_resets(&self) -> Vec<String> {
        self.resets.read().await.clone()
    }

    async fn update_user<F>(&self, user_id: &str, apply: F) -> Result<ProviderUser, IdentityError>
    where
        F: FnOnce(&mut ProviderUser),
    {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|user| user.user_id == full_id(user_id))
            .ok_or_else(|| IdentityError::Status {
                status: 404,
                body: "The user does not exist.".to_string(),
            })?;
        apply(user);
        Ok(user.clone())
    }
}

fn full_id(user_id: &str) -> String {
    if user_id.contains('|') {
        user_id.to_string()
    } else {
        format!("{}|{}", DEFAULT_CONNECTION, user_id)
    }
}

#[async_trait]
impl IdentityProvider for InMemoryDirectory {
    fn provider_name(&self) -> &str {
        "in-memory"
    }

    async fn users_by_email(&self, email: &str) -> Result<Vec<ProviderUser>, IdentityError> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter(|user| user.email.as_deref() == Some(email))
            .cloned()
            .collect())
    }

    async fn set_nickname(&self, user_id: &str, nickname: &str) -> Result<ProviderUser, IdentityError> {
        self.update_user(user_id, |user| user.nickname = Some(nickname.to_string()))
            .await
    }

    async fn set_picture(&self, user_id: &str, picture_url: &str) -> Result<ProviderUser, IdentityError> {
        self.update_user(user_id, |user| user.picture = Some(picture_url.to_string()))
            .await
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), IdentityError> {
        let mut users = self.users.write().await;
        let before = users.len();
        let full = full_id(user_id);
        users.retain(|user| user.user_id != full);
        if users.len() == before {
            return Err(IdentityError::Status {
                status: 404,
                body: "The user does not exist.".to_string(),
            });
        }
        self.roles.write().await.remove(&full);
        Ok(())
    }

    async fn user_roles(&self, user_id: &str) -> Result<Vec<Role>, IdentityError> {
        let roles = self.roles.read().await;
        Ok(roles.get(&full_id(user_id)).cloned().unwrap_or_default())
    }

    async fn send_password_reset(&self, email: &str) -> Result<String, IdentityError> {
        self.resets.write().await.push(email.to_string());
        Ok(PASSWORD_RESET_SENT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, email: &str) -> ProviderUser {
        ProviderUser {
            user_id: format!("auth0|{}", id),
            email: Some(email.to_string()),
            nickname: Some(id.to_string()),
            ..ProviderUser::default()
        }
    }

    #[tokio::test]
    async fn test_users_are_addressed_by_local_or_full_id() {
        let directory = InMemoryDirectory::new();
        directory.add_user(user("abc", "ana@example.com")).await;

        let updated = directory.set_nickname("abc", "ana_b").await.unwrap();
        assert_eq!(updated.nickname.as_deref(), Some("ana_b"));
        let updated = directory.set_picture("auth0|abc", "https://x/p.png").await.unwrap();
        assert_eq!(updated.picture.as_deref(), Some("https://x/p.png"));

        let found = directory.users_by_email("ana@example.com").await.unwrap();
        assert_eq!(found[0].nickname.as_deref(), Some("ana_b"));
    }

    #[tokio::test]
    async fn test_full_ids_keep_their_connection() {
        let directory = InMemoryDirectory::new();
        directory
            .add_user(ProviderUser {
                user_id: "google-oauth2|1077".to_string(),
                email: Some("gil@example.com".to_string()),
                ..ProviderUser::default()
            })
            .await;
        directory
            .grant_role("google-oauth2|1077", Role { id: "rol_1".into(), name: "MovieDB Admin".into(), description: None })
            .await;

        assert_eq!(directory.user_roles("google-oauth2|1077").await.unwrap().len(), 1);
        assert!(directory.user_roles("1077").await.unwrap().is_empty());
        assert!(matches!(
            directory.set_nickname("1077", "gil").await,
            Err(IdentityError::Status { status: 404, .. })
        ));
        let updated = directory.set_nickname("google-oauth2|1077", "gil").await.unwrap();
        assert_eq!(updated.nickname.as_deref(), Some("gil"));
    }

    #[tokio::test]
    async fn test_delete_unknown_user_fails() {
        let directory = InMemoryDirectory::new();
        directory.add_user(user("abc", "ana@example.com")).await;
        directory
            .grant_role("auth0|abc", Role { id: "rol_1".into(), name: "MovieDB Admin".into(), description: None })
            .await;

        directory.delete_user("abc").await.unwrap();
        assert!(directory.user_roles("abc").await.unwrap().is_empty());
        assert!(matches!(
            directory.delete_user("abc").await,
            Err(IdentityError::Status { status: 404, .. })
        ));
    }
}
