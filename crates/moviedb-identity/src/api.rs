use moviedb_models::{ProviderUser, Role};
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::debug;

use crate::error::IdentityError;

/// Path segment addressing a user: `prefix|id`, percent-encoded. Ids that
/// already carry a connection prefix are used as given.
pub fn user_path_segment(prefix: &str, user_id: &str) -> String {
    let full_id = if user_id.contains('|') {
        user_id.to_string()
    } else {
        format!("{}|{}", prefix, user_id)
    };
    urlencoding::encode(&full_id).into_owned()
}

async fn ensure_success(response: Response) -> Result<Response, IdentityError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(IdentityError::Status { status, body })
}

/// Search users by email (user search engine v3)
pub async fn get_users_by_email(
    client: &Client,
    base_url: &str,
    access_token: &str,
    email: &str,
) -> Result<Vec<ProviderUser>, IdentityError> {
    let query = format!("email:\"{}\"", email);
    let response = client
        .get(format!("{}/api/v2/users", base_url))
        .query(&[("q", query.as_str()), ("search_engine", "v3")])
        .bearer_auth(access_token)
        .send()
        .await?;

    let users: Vec<ProviderUser> = ensure_success(response).await?.json().await?;
    debug!("Found {} users for email lookup", users.len());
    Ok(users)
}

pub async fn patch_user(
    client: &Client,
    base_url: &str,
    access_token: &str,
    user_segment: &str,
    changes: &Value,
) -> Result<ProviderUser, IdentityError> {
    let response = client
        .patch(format!("{}/api/v2/users/{}", base_url, user_segment))
        .bearer_auth(access_token)
        .header("Cache-Control", "no-cache")
        .json(changes)
        .send()
        .await?;

    Ok(ensure_success(response).await?.json().await?)
}

pub async fn delete_user(
    client: &Client,
    base_url: &str,
    access_token: &str,
    user_segment: &str,
) -> Result<(), IdentityError> {
    let response = client
        .delete(format!("{}/api/v2/users/{}", base_url, user_segment))
        .bearer_auth(access_token)
        .send()
        .await?;

    ensure_success(response).await?;
    Ok(())
}

pub async fn get_user_roles(
    client: &Client,
    base_url: &str,
    access_token: &str,
    user_segment: &str,
) -> Result<Vec<Role>, IdentityError> {
    let response = client
        .get(format!("{}/api/v2/users/{}/roles", base_url, user_segment))
        .bearer_auth(access_token)
        .send()
        .await?;

    Ok(ensure_success(response).await?.json().await?)
}

/// Trigger the database connection's password reset email. This endpoint is
/// public and takes the frontend application's client id, not a token.
pub async fn change_password(
    client: &Client,
    base_url: &str,
    app_client_id: &str,
    connection: &str,
    email: &str,
) -> Result<String, IdentityError> {
    let payload = serde_json::json!({
        "client_id": app_client_id,
        "email": email,
        "connection": connection,
    });

    let response = client
        .post(format!("{}/dbconnections/change_password", base_url))
        .json(&payload)
        .send()
        .await?;

    let text = ensure_success(response).await?.text().await?;
    // The confirmation may come back as a JSON string or as plain text
    Ok(serde_json::from_str::<String>(&text).unwrap_or(text))
}
