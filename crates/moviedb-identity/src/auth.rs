use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::IdentityError;

/// Tokens are treated as expired this long before the provider says so.
const EXPIRY_MARGIN_SECS: i64 = 120;

/// Create the reqwest Client shared by all management calls
pub fn create_identity_client() -> Client {
    Client::builder()
        .user_agent(concat!("moviedb/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(15))
        .build()
        .unwrap_or_else(|_| Client::new())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    scope: String,
    expires_in: i64,
    #[serde(default)]
    token_type: String,
}

#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub access_token: String,
    pub token_type: String,
    pub scope: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenInfo {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Exchange the machine-to-machine credentials for a management API token
/// (OAuth client credentials grant).
pub async fn request_management_token(
    client: &Client,
    base_url: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<TokenInfo, IdentityError> {
    let base_url = base_url.trim_end_matches('/');
    let payload = serde_json::json!({
        "grant_type": "client_credentials",
        "client_id": client_id,
        "client_secret": client_secret,
        "audience": format!("{}/api/v2/", base_url),
    });

    let response = client
        .post(format!("{}/oauth/token", base_url))
        .json(&payload)
        .header("Accept", "application/json")
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(IdentityError::Status { status, body });
    }

    let token_response: TokenResponse = response.json().await?;
    let lifetime = (token_response.expires_in - EXPIRY_MARGIN_SECS).max(0);
    let expires_at = Utc::now() + Duration::seconds(lifetime);
    debug!("Obtained management API token (expires at {})", expires_at);

    Ok(TokenInfo {
        access_token: token_response.access_token,
        token_type: token_response.token_type,
        scope: token_response.scope,
        expires_at,
    })
}
