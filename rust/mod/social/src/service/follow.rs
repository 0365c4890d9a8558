use std::collections::HashSet;

use recharge_sql::Value;
use tracing::info;

use crate::model::{FollowEntry, FollowKey, FollowOutcome, NotificationRequest};
use crate::service::{SocialError, SocialService, require};

impl SocialService {
    fn validate_follow(&self, key: &FollowKey) -> Result<(), SocialError> {
        require("followerId", &key.follower_id)?;
        require("followingId", &key.following_id)?;
        if !self.config.allow_self_follow && key.is_self_follow() {
            return Err(SocialError::Validation("users cannot follow themselves".into()));
        }
        Ok(())
    }

    /// Follow a user.
    ///
    /// The edge insert is the only write that can fail the request. A new
    /// edge queues a follow notification; the target's counters are then
    /// recomputed and returned.
    pub fn follow(&self, key: &FollowKey) -> Result<FollowOutcome, SocialError> {
        self.validate_follow(key)?;

        let created = self.insert_edge(key)?;
        if created {
            info!(follower = %key.follower_id, following = %key.following_id, "follow created");
            self.notifications
                .dispatch(NotificationRequest::follow(&key.follower_id, &key.following_id));
        }

        let feed = self.refresh_feed_counter(&key.following_id)?;
        Ok(FollowOutcome {
            success: created,
            message: (if created { "followed" } else { "already following" }).to_string(),
            feed,
        })
    }

    /// Unfollow a user. The target's counters are refreshed either way.
    pub fn unfollow(&self, key: &FollowKey) -> Result<FollowOutcome, SocialError> {
        require("followerId", &key.follower_id)?;
        require("followingId", &key.following_id)?;

        let existed = self.delete_edge(key)?;
        if existed {
            info!(follower = %key.follower_id, following = %key.following_id, "follow removed");
        }

        let feed = self.refresh_feed_counter(&key.following_id)?;
        Ok(FollowOutcome {
            success: existed,
            message: (if existed { "unfollowed" } else { "not following" }).to_string(),
            feed,
        })
    }

    pub fn is_following(&self, key: &FollowKey) -> Result<bool, SocialError> {
        self.edge_exists(key)
    }

    /// Which of `candidates` does `follower_id` follow.
    pub fn followed_subset(
        &self,
        follower_id: &str,
        candidates: &[String],
    ) -> Result<HashSet<String>, SocialError> {
        let unique: HashSet<&str> = candidates.iter().map(String::as_str).collect();
        let values: Vec<Value> = unique.into_iter().map(Value::from).collect();

        let found = self.edge_subset(
            "follows",
            &[("follower_id", Value::Text(follower_id.to_string()))],
            "following_id",
            &values,
        )?;
        Ok(found
            .into_iter()
            .filter_map(|v| match v {
                Value::Text(s) => Some(s),
                _ => None,
            })
            .collect())
    }

    /// Users that `follower_id` follows, each flagged with whether
    /// `viewer_id` follows them too.
    pub fn following_list(
        &self,
        follower_id: &str,
        viewer_id: &str,
    ) -> Result<Vec<FollowEntry>, SocialError> {
        let edges = self.list_edges("follower_id", follower_id)?;
        let shown: Vec<String> = edges.iter().map(|(_, following, _)| following.clone()).collect();
        let followed = self.followed_subset(viewer_id, &shown)?;

        Ok(edges
            .into_iter()
            .map(|(follower_id, following_id, created_at)| FollowEntry {
                is_following: followed.contains(&following_id),
                follower_id,
                following_id,
                created_at,
            })
            .collect())
    }

    /// Users following `following_id`, each flagged with whether
    /// `viewer_id` follows them.
    pub fn follower_list(
        &self,
        following_id: &str,
        viewer_id: &str,
    ) -> Result<Vec<FollowEntry>, SocialError> {
        let edges = self.list_edges("following_id", following_id)?;
        let shown: Vec<String> = edges.iter().map(|(follower, _, _)| follower.clone()).collect();
        let followed = self.followed_subset(viewer_id, &shown)?;

        Ok(edges
            .into_iter()
            .map(|(follower_id, following_id, created_at)| FollowEntry {
                is_following: followed.contains(&follower_id),
                follower_id,
                following_id,
                created_at,
            })
            .collect())
    }

    /// `(follower_id, following_id, created_at)` rows matching one column, newest first.
    fn list_edges(
        &self,
        column: &str,
        user_id: &str,
    ) -> Result<Vec<(String, String, String)>, SocialError> {
        let sql = format!(
            "SELECT follower_id, following_id, created_at FROM follows
             WHERE {} = ?1 ORDER BY created_at DESC",
            column
        );
        let rows = self.sql.query(&sql, &[Value::Text(user_id.to_string())])?;
        rows.iter()
            .map(|row| {
                match (
                    row.get_string("follower_id"),
                    row.get_string("following_id"),
                    row.get_string("created_at"),
                ) {
                    (Some(a), Some(b), Some(c)) => Ok((a, b, c)),
                    _ => Err(SocialError::Internal("malformed follows row".into())),
                }
            })
            .collect()
    }
}
