//! Identity records returned for API keys and server IDs

use serde::{Deserialize, Serialize};

pub const DEFAULT_ENVIRONMENT: &str = "live";
pub const DEFAULT_USERNAME: &str = "";
pub const DEFAULT_USER_ID: &str = "-1";

/// The identity an API key or server ID maps to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,
    pub environment: String,
    pub username: String,
    pub user_id: String,
}

impl UserInfo {
    /// The placeholder identity used when a key is unknown
    pub fn default_user() -> Self {
        Self {
            api_key: String::new(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
        }
    }

    /// True for the placeholder identity (no real user behind it)
    pub fn is_default(&self) -> bool {
        self.user_id == DEFAULT_USER_ID
    }
}

impl Default for UserInfo {
    fn default() -> Self {
        Self::default_user()
    }
}

/// Shorten an API key for logs: `abcd...yz`. Keys under 10 characters are
/// returned unchanged. Also returns the key's length.
pub fn mask_api_key(key: &str) -> (String, usize) {
    let length = key.chars().count();
    if length < 10 {
        return (key.to_string(), length);
    }

    let head: String = key.chars().take(4).collect();
    let tail: String = key.chars().skip(length - 2).collect();
    (format!("{head}...{tail}"), length)
}
