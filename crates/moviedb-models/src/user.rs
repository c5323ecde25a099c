use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A user record as returned by the identity provider's management API.
///
/// Only the fields this service reads are typed; everything else is kept in
/// `extra` so the profile page receives the record unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProviderUser {
    pub user_id: String, // "<connection>|<id>", e.g. "auth0|5f7c..."
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProviderUser {
    /// The provider-local part of `user_id` (after the `|`).
    pub fn local_id(&self) -> &str {
        self.user_id
            .split_once('|')
            .map(|(_, id)| id)
            .unwrap_or(&self.user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_user_keeps_unknown_fields() {
        let raw = r#"{
            "user_id": "auth0|abc123",
            "email": "ana@example.com",
            "nickname": "ana",
            "logins_count": 4,
            "identities": [{"provider": "auth0"}]
        }"#;

        let user: ProviderUser = serde_json::from_str(raw).unwrap();
        assert_eq!(user.local_id(), "abc123");
        assert_eq!(user.nickname.as_deref(), Some("ana"));
        assert_eq!(user.extra["logins_count"], 4);

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["identities"][0]["provider"], "auth0");
    }

    #[test]
    fn test_local_id_without_connection_prefix() {
        let user = ProviderUser {
            user_id: "plain".to_string(),
            ..ProviderUser::default()
        };
        assert_eq!(user.local_id(), "plain");
    }
}
