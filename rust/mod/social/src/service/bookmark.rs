use std::collections::{HashMap, HashSet};

use recharge_sql::Value;

use crate::model::{Bookmark, BookmarkKey};
use crate::service::{SocialError, SocialService, require};

impl SocialService {
    fn validate_bookmark(key: &BookmarkKey) -> Result<(), SocialError> {
        require("userId", &key.user_id)?;
        require("targetType", &key.target_type)
    }

    /// Toggle a bookmark. Returns whether the target is bookmarked afterwards.
    pub fn toggle_bookmark(&self, key: &BookmarkKey) -> Result<bool, SocialError> {
        Self::validate_bookmark(key)?;
        self.toggle_edge(key)
    }

    pub fn check_bookmark(&self, key: &BookmarkKey) -> Result<bool, SocialError> {
        self.edge_exists(key)
    }

    /// Bookmarked state of every requested target id, for painting list views.
    pub fn bookmark_status_map(
        &self,
        user_id: &str,
        target_type: &str,
        target_ids: &[i64],
    ) -> Result<HashMap<i64, bool>, SocialError> {
        let bookmarked = self.bookmarked_subset(user_id, target_type, target_ids)?;
        Ok(target_ids
            .iter()
            .map(|id| (*id, bookmarked.contains(id)))
            .collect())
    }

    /// Which of `target_ids` the user has bookmarked.
    pub fn bookmarked_subset(
        &self,
        user_id: &str,
        target_type: &str,
        target_ids: &[i64],
    ) -> Result<HashSet<i64>, SocialError> {
        let unique: HashSet<i64> = target_ids.iter().copied().collect();
        let values: Vec<Value> = unique.into_iter().map(Value::Integer).collect();

        let found = self.edge_subset(
            "bookmarks",
            &[
                ("user_id", Value::Text(user_id.to_string())),
                ("target_type", Value::Text(target_type.to_string())),
            ],
            "target_id",
            &values,
        )?;
        Ok(found
            .into_iter()
            .filter_map(|v| match v {
                Value::Integer(i) => Some(i),
                _ => None,
            })
            .collect())
    }

    /// All of a user's bookmarks, newest first.
    pub fn user_bookmarks(&self, user_id: &str) -> Result<Vec<Bookmark>, SocialError> {
        let rows = self.sql.query(
            "SELECT user_id, target_type, target_id, created_at FROM bookmarks
             WHERE user_id = ?1 ORDER BY created_at DESC",
            &[Value::Text(user_id.to_string())],
        )?;

        rows.iter()
            .map(|row| {
                Ok(Bookmark {
                    user_id: row
                        .get_string("user_id")
                        .ok_or_else(|| SocialError::Internal("bookmarks.user_id missing".into()))?,
                    target_type: row
                        .get_string("target_type")
                        .ok_or_else(|| SocialError::Internal("bookmarks.target_type missing".into()))?,
                    target_id: row
                        .get_i64("target_id")
                        .ok_or_else(|| SocialError::Internal("bookmarks.target_id missing".into()))?,
                    created_at: row.get_string("created_at").unwrap_or_default(),
                })
            })
            .collect()
    }
}
