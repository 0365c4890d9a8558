use serde::{Deserialize, Serialize};

/// Role given to every self-registered or social account.
pub const ROLE_USER: &str = "USER";

/// Social provider tag for Kakao accounts.
pub const SOCIAL_KAKAO: &str = "KAKAO";

/// A user account as returned to clients. The password hash never leaves
/// the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Login id chosen at registration (`kakao_<id>` for Kakao accounts).
    pub user_id: String,

    pub user_name: String,

    /// Unique display name.
    pub user_nickname: String,

    pub user_email: String,

    #[serde(default = "default_role")]
    pub user_role: String,

    /// Provider-side id for social accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_os: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_version: Option<String>,

    /// Push token of the user's current device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_token: Option<String>,

    pub created_at: String,
    pub updated_at: String,
}

fn default_role() -> String {
    ROLE_USER.to_string()
}

/// Profile fetched from a social login provider.
#[derive(Debug, Clone, PartialEq)]
pub struct SocialProfile {
    pub social_id: String,
    pub social_type: String,
    pub nickname: String,
    pub name: String,
    pub email: String,
}
