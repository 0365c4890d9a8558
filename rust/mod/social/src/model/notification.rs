use serde::{Deserialize, Serialize};

/// Notification kind sent when someone follows a user.
pub const KIND_FOLLOW: &str = "FOLLOW";

/// Source type of follow notifications.
pub const SOURCE_FOLLOW: &str = "follow";

/// A request to notify `recipient_id` about something `sender_id` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub sender_id: String,
    pub source_type: String,
    pub recipient_id: String,
    pub kind: String,
}

impl NotificationRequest {
    pub fn follow(follower_id: &str, following_id: &str) -> Self {
        Self {
            sender_id: follower_id.to_string(),
            source_type: SOURCE_FOLLOW.to_string(),
            recipient_id: following_id.to_string(),
            kind: KIND_FOLLOW.to_string(),
        }
    }
}

/// A stored notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub sender_id: String,
    pub source_type: String,
    pub recipient_id: String,
    pub kind: String,
    pub title: String,
    pub read: bool,
    pub created_at: String,
}
