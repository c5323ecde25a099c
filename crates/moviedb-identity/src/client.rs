use async_trait::async_trait;
use chrono::Utc;
use moviedb_config::IdentityConfig;
use moviedb_models::{ProviderUser, Role};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::api;
use crate::auth::{self, TokenInfo};
use crate::error::IdentityError;
use crate::traits::IdentityProvider;

/// Auth0 management API client.
///
/// The management token is fetched lazily and reused until shortly before it
/// expires. It never leaves this type.
#[derive(Clone)]
pub struct Auth0Client {
    client: Arc<Client>,
    config: IdentityConfig,
    token: Arc<Mutex<Option<TokenInfo>>>,
}

impl Auth0Client {
    pub fn new(mut config: IdentityConfig) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self {
            client: Arc::new(auth::create_identity_client()),
            config,
            token: Arc::new(Mutex::new(None)),
        }
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn base_url(&self) -> Result<&str, IdentityError> {
        if self.config.base_url.is_empty() {
            return Err(IdentityError::NotConfigured);
        }
        Ok(&self.config.base_url)
    }

    async fn access_token(&self) -> Result<String, IdentityError> {
        if !self.is_configured() {
            return Err(IdentityError::NotConfigured);
        }

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_valid_at(Utc::now()) {
                return Ok(token.access_token.clone());
            }
            info!("Management API token expired at {}, requesting a new one", token.expires_at);
        }

        let token = auth::request_management_token(
            &self.client,
            &self.config.base_url,
            &self.config.client_id,
            &self.config.client_secret,
        )
        .await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    fn user_segment(&self, user_id: &str) -> String {
        api::user_path_segment(&self.config.user_id_prefix, user_id)
    }
}

#[async_trait]
impl IdentityProvider for Auth0Client {
    fn provider_name(&self) -> &str {
        "auth0"
    }

    async fn users_by_email(&self, email: &str) -> Result<Vec<ProviderUser>, IdentityError> {
        let token = self.access_token().await?;
        api::get_users_by_email(&self.client, self.base_url()?, &token, email).await
    }

    async fn set_nickname(&self, user_id: &str, nickname: &str) -> Result<ProviderUser, IdentityError> {
        let token = self.access_token().await?;
        let changes = serde_json::json!({ "nickname": nickname });
        api::patch_user(&self.client, self.base_url()?, &token, &self.user_segment(user_id), &changes).await
    }

    async fn set_picture(&self, user_id: &str, picture_url: &str) -> Result<ProviderUser, IdentityError> {
        let token = self.access_token().await?;
        let changes = serde_json::json!({ "picture": picture_url });
        api::patch_user(&self.client, self.base_url()?, &token, &self.user_segment(user_id), &changes).await
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), IdentityError> {
        let token = self.access_token().await?;
        api::delete_user(&self.client, self.base_url()?, &token, &self.user_segment(user_id)).await
    }

    async fn user_roles(&self, user_id: &str) -> Result<Vec<Role>, IdentityError> {
        let token = self.access_token().await?;
        api::get_user_roles(&self.client, self.base_url()?, &token, &self.user_segment(user_id)).await
    }

    async fn send_password_reset(&self, email: &str) -> Result<String, IdentityError> {
        api::change_password(
            &self.client,
            self.base_url()?,
            &self.config.app_client_id,
            &self.config.connection,
            email,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PASSWORD_RESET_SENT;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    fn config_for(server: &ServerGuard) -> IdentityConfig {
        IdentityConfig {
            base_url: server.url(),
            client_id: "m2m_id".to_string(),
            client_secret: "m2m_secret".to_string(),
            app_client_id: "spa_id".to_string(),
            ..IdentityConfig::default()
        }
    }

    async fn mock_token(server: &mut ServerGuard, expires_in: i64, expected_calls: usize) -> mockito::Mock {
        let audience = format!("{}/api/v2/", server.url());
        server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::PartialJson(json!({
                "grant_type": "client_credentials",
                "client_id": "m2m_id",
                "client_secret": "m2m_secret",
                "audience": audience,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "access_token": "mgmt_token",
                    "scope": "read:users update:users",
                    "expires_in": expires_in,
                    "token_type": "Bearer"
                })
                .to_string(),
            )
            .expect(expected_calls)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_users_by_email_reuses_token() {
        let mut server = Server::new_async().await;
        let token_mock = mock_token(&mut server, 86400, 1).await;
        let users_mock = server
            .mock("GET", "/api/v2/users")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "email:\"ana@example.com\"".into()),
                Matcher::UrlEncoded("search_engine".into(), "v3".into()),
            ]))
            .match_header("authorization", "Bearer mgmt_token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([{ "user_id": "auth0|abc", "email": "ana@example.com", "nickname": "ana" }]).to_string())
            .expect(2)
            .create_async()
            .await;

        let client = Auth0Client::new(config_for(&server));
        let users = client.users_by_email("ana@example.com").await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].local_id(), "abc");
        client.users_by_email("ana@example.com").await.unwrap();

        token_mock.assert_async().await;
        users_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed() {
        let mut server = Server::new_async().await;
        // Lifetime shorter than the expiry margin: every call needs a new token
        let token_mock = mock_token(&mut server, 60, 2).await;
        let roles_mock = server
            .mock("GET", Matcher::Regex(r"^/api/v2/users/auth0(%7C|\|)abc/roles$".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([{ "id": "rol_1", "name": "MovieDB Admin" }]).to_string())
            .expect(2)
            .create_async()
            .await;

        let client = Auth0Client::new(config_for(&server));
        let roles = client.user_roles("abc").await.unwrap();
        assert_eq!(roles[0].name, "MovieDB Admin");
        client.user_roles("abc").await.unwrap();

        token_mock.assert_async().await;
        roles_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_set_nickname_patches_prefixed_user() {
        let mut server = Server::new_async().await;
        let _token_mock = mock_token(&mut server, 86400, 1).await;
        let patch_mock = server
            .mock("PATCH", Matcher::Regex(r"^/api/v2/users/auth0(%7C|\|)abc$".to_string()))
            .match_header("authorization", "Bearer mgmt_token")
            .match_body(Matcher::Json(json!({ "nickname": "neo" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "user_id": "auth0|abc", "nickname": "neo" }).to_string())
            .create_async()
            .await;

        let client = Auth0Client::new(config_for(&server));
        let user = client.set_nickname("abc", "neo").await.unwrap();
        assert_eq!(user.nickname.as_deref(), Some("neo"));
        patch_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_password_reset_uses_app_client() {
        let mut server = Server::new_async().await;
        let reset_mock = server
            .mock("POST", "/dbconnections/change_password")
            .match_body(Matcher::Json(json!({
                "client_id": "spa_id",
                "email": "ana@example.com",
                "connection": "Username-Password-Authentication",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::to_string(PASSWORD_RESET_SENT).unwrap())
            .create_async()
            .await;

        let client = Auth0Client::new(config_for(&server));
        let message = client.send_password_reset("ana@example.com").await.unwrap();
        assert_eq!(message, PASSWORD_RESET_SENT);
        reset_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mut server = Server::new_async().await;
        let _token_mock = mock_token(&mut server, 86400, 1).await;
        let _delete_mock = server
            .mock("DELETE", Matcher::Regex(r"^/api/v2/users/auth0(%7C|\|)gone$".to_string()))
            .with_status(404)
            .with_body("The user does not exist.")
            .create_async()
            .await;

        let client = Auth0Client::new(config_for(&server));
        match client.delete_user("gone").await {
            Err(IdentityError::Status { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "The user does not exist.");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unconfigured_client_fails_fast() {
        let client = Auth0Client::new(IdentityConfig::default());
        assert!(matches!(
            client.users_by_email("ana@example.com").await,
            Err(IdentityError::NotConfigured)
        ));
    }
}
