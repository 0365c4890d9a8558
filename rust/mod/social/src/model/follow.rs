use serde::{Deserialize, Serialize};

use crate::model::FeedCounter;

/// A directed follow edge: `follower_id` follows `following_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowKey {
    pub follower_id: String,
    pub following_id: String,
}

impl FollowKey {
    pub fn new(follower_id: impl Into<String>, following_id: impl Into<String>) -> Self {
        Self {
            follower_id: follower_id.into(),
            following_id: following_id.into(),
        }
    }

    pub fn is_self_follow(&self) -> bool {
        self.follower_id == self.following_id
    }
}

/// A follow edge row as listed on the follower/following screens.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowEntry {
    pub follower_id: String,
    pub following_id: String,
    pub created_at: String,

    /// Whether the viewing user follows the user shown in this row.
    pub is_following: bool,
}

/// Result of a follow or unfollow request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowOutcome {
    /// Follow: the edge was created. Unfollow: the edge existed and was removed.
    pub success: bool,
    pub message: String,

    /// The target user's counters, recomputed after the write.
    pub feed: FeedCounter,
}

/// Query for the following list of `follower_id`, seen by `my_user_id`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowingListQuery {
    pub follower_id: String,
    pub my_user_id: String,
}

/// Query for the follower list of `following_id`, seen by `my_user_id`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowerListQuery {
    pub following_id: String,
    pub my_user_id: String,
}
