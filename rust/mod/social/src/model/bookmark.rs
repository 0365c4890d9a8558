use serde::{Deserialize, Serialize};

/// Composite key of a bookmark: who bookmarked which target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkKey {
    pub user_id: String,

    /// Kind of bookmarked content, e.g. `POST`, `MOVIE`, `MUSIC`.
    pub target_type: String,
    pub target_id: i64,
}

impl BookmarkKey {
    pub fn new(user_id: impl Into<String>, target_type: impl Into<String>, target_id: i64) -> Self {
        Self {
            user_id: user_id.into(),
            target_type: target_type.into(),
            target_id,
        }
    }
}

/// A stored bookmark.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub user_id: String,
    pub target_type: String,
    pub target_id: i64,
    pub created_at: String,
}

/// Request body for the list-view status lookup.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkStatusRequest {
    pub user_id: String,
    pub target_type: String,
    #[serde(default)]
    pub target_ids: Vec<i64>,
}
