use serde::{Deserialize, Serialize};

/// Denormalized per-user counters shown on the profile page.
///
/// A cache over `posts` and `follows`; only ever rewritten by recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedCounter {
    pub user_id: String,

    /// Number of posts authored by the user.
    pub total_count: i64,
    pub follower_count: i64,
    pub following_count: i64,
    pub updated_at: String,
}
