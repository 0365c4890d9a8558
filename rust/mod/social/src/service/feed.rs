use recharge_core::now_rfc3339;
use recharge_sql::{Row, Statement, Value};

use crate::model::FeedCounter;
use crate::service::{SocialError, SocialService, require};

const UPSERT_EMPTY_FEED: &str = "INSERT INTO user_feeds
        (user_id, total_count, follower_count, following_count, created_at, updated_at)
    VALUES (?1, 0, 0, 0, ?2, ?2)
    ON CONFLICT(user_id) DO NOTHING";

const RECOMPUTE_FEED: &str = "UPDATE user_feeds SET
        total_count = (SELECT COUNT(*) FROM posts WHERE author_id = ?1),
        follower_count = (SELECT COUNT(*) FROM follows WHERE following_id = ?1),
        following_count = (SELECT COUNT(*) FROM follows WHERE follower_id = ?1),
        updated_at = ?2
    WHERE user_id = ?1";

impl SocialService {
    /// Resync the user's counter row from the authoritative tables.
    ///
    /// Creates the row on first access. Recomputation replaces the stored
    /// values instead of applying deltas, so overlapping refreshes converge.
    pub fn refresh_feed_counter(&self, user_id: &str) -> Result<FeedCounter, SocialError> {
        require("userId", user_id)?;

        let params = vec![Value::Text(user_id.to_string()), Value::Text(now_rfc3339())];
        self.sql.exec_atomic(&[
            Statement::new(UPSERT_EMPTY_FEED, params.clone()),
            Statement::new(RECOMPUTE_FEED, params),
        ])?;

        self.get_feed_counter(user_id)?
            .ok_or_else(|| SocialError::Internal(format!("feed counter for '{}' vanished", user_id)))
    }

    /// Read the cached counter without recomputing it.
    pub fn get_feed_counter(&self, user_id: &str) -> Result<Option<FeedCounter>, SocialError> {
        let rows = self.sql.query(
            "SELECT user_id, total_count, follower_count, following_count, updated_at
             FROM user_feeds WHERE user_id = ?1",
            &[Value::Text(user_id.to_string())],
        )?;
        rows.first().map(row_to_counter).transpose()
    }
}

fn row_to_counter(row: &Row) -> Result<FeedCounter, SocialError> {
    let missing = |col: &str| SocialError::Internal(format!("user_feeds.{} missing", col));
    Ok(FeedCounter {
        user_id: row.get_string("user_id").ok_or_else(|| missing("user_id"))?,
        total_count: row.get_i64("total_count").ok_or_else(|| missing("total_count"))?,
        follower_count: row.get_i64("follower_count").ok_or_else(|| missing("follower_count"))?,
        following_count: row.get_i64("following_count").ok_or_else(|| missing("following_count"))?,
        updated_at: row.get_string("updated_at").ok_or_else(|| missing("updated_at"))?,
    })
}
