//! Relationship edges addressed by a composite key.
//!
//! Every mutation is a single conditional statement (`DELETE` by key,
//! `INSERT OR IGNORE`), so the table's primary key decides races: an edge
//! can never be stored twice, and the affected-row count tells the caller
//! which side of a race it was on.

use recharge_core::now_rfc3339;
use recharge_sql::Value;
use tracing::{debug, warn};

use crate::model::{BookmarkKey, FollowKey};
use crate::service::{SocialError, SocialService};

/// SQLite's historical bound-parameter limit is 999; stay well below it.
const LOOKUP_CHUNK: usize = 500;

/// A relationship row identified by its composite primary key.
pub(crate) trait Edge {
    const TABLE: &'static str;

    /// Key columns with their values, in primary-key order.
    fn key(&self) -> Vec<(&'static str, Value)>;
}

impl Edge for FollowKey {
    const TABLE: &'static str = "follows";

    fn key(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("follower_id", Value::Text(self.follower_id.clone())),
            ("following_id", Value::Text(self.following_id.clone())),
        ]
    }
}

impl Edge for BookmarkKey {
    const TABLE: &'static str = "bookmarks";

    fn key(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", Value::Text(self.user_id.clone())),
            ("target_type", Value::Text(self.target_type.clone())),
            ("target_id", Value::Integer(self.target_id)),
        ]
    }
}

/// `a = ?1 AND b = ?2 ...` for the given columns.
fn key_predicate(columns: &[&str]) -> String {
    columns
        .iter()
        .enumerate()
        .map(|(i, col)| format!("{} = ?{}", col, i + 1))
        .collect::<Vec<_>>()
        .join(" AND ")
}

impl SocialService {
    /// Whether the edge is currently stored.
    pub(crate) fn edge_exists<E: Edge>(&self, edge: &E) -> Result<bool, SocialError> {
        let (columns, params): (Vec<&str>, Vec<Value>) = edge.key().into_iter().unzip();
        let sql = format!(
            "SELECT 1 AS present FROM {} WHERE {} LIMIT 1",
            E::TABLE,
            key_predicate(&columns),
        );
        let rows = self.sql.query(&sql, &params)?;
        Ok(!rows.is_empty())
    }

    /// Insert the edge unless it exists. Returns `true` if this call created it.
    pub(crate) fn insert_edge<E: Edge>(&self, edge: &E) -> Result<bool, SocialError> {
        let (mut columns, mut params): (Vec<&str>, Vec<Value>) = edge.key().into_iter().unzip();
        columns.push("created_at");
        params.push(Value::Text(now_rfc3339()));

        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT OR IGNORE INTO {} ({}) VALUES ({})",
            E::TABLE,
            columns.join(", "),
            placeholders.join(", "),
        );
        Ok(self.sql.exec(&sql, &params)? > 0)
    }

    /// Delete the edge. Returns `true` if it existed.
    pub(crate) fn delete_edge<E: Edge>(&self, edge: &E) -> Result<bool, SocialError> {
        let (columns, params): (Vec<&str>, Vec<Value>) = edge.key().into_iter().unzip();
        let sql = format!("DELETE FROM {} WHERE {}", E::TABLE, key_predicate(&columns));
        Ok(self.sql.exec(&sql, &params)? > 0)
    }

    /// Flip the edge: remove it if present, create it if absent.
    ///
    /// Returns whether the edge exists after the call. When both the delete
    /// and the insert affect nothing, another toggle slipped in between them;
    /// the round is retried. If every round is lost the observed state is
    /// reported rather than an error.
    pub(crate) fn toggle_edge<E: Edge>(&self, edge: &E) -> Result<bool, SocialError> {
        let attempts = self.config.toggle_attempts.max(1);
        for attempt in 1..=attempts {
            if self.delete_edge(edge)? {
                return Ok(false);
            }
            if self.insert_edge(edge)? {
                return Ok(true);
            }
            debug!(table = E::TABLE, attempt, "toggle raced with a concurrent writer, retrying");
        }

        let present = self.edge_exists(edge)?;
        warn!(
            table = E::TABLE,
            attempts, present, "toggle did not settle, reporting observed state"
        );
        Ok(present)
    }

    /// Return the subset of `candidates` stored in `table` under `owner`.
    ///
    /// `owner` fixes the leading key columns; `target_column` is matched
    /// against the candidates. Callers pass de-duplicated candidates.
    pub(crate) fn edge_subset(
        &self,
        table: &str,
        owner: &[(&str, Value)],
        target_column: &str,
        candidates: &[Value],
    ) -> Result<Vec<Value>, SocialError> {
        let mut found = Vec::new();
        if candidates.is_empty() {
            return Ok(found);
        }

        let owner_columns: Vec<&str> = owner.iter().map(|(c, _)| *c).collect();
        let owner_predicate = key_predicate(&owner_columns);

        for chunk in candidates.chunks(LOOKUP_CHUNK) {
            let first = owner.len() + 1;
            let placeholders: Vec<String> =
                (first..first + chunk.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT {col} FROM {table} WHERE {owner} AND {col} IN ({list})",
                col = target_column,
                table = table,
                owner = owner_predicate,
                list = placeholders.join(", "),
            );

            let mut params: Vec<Value> = owner.iter().map(|(_, v)| v.clone()).collect();
            params.extend(chunk.iter().cloned());

            for row in self.sql.query(&sql, &params)? {
                if let Some(value) = row.get(target_column) {
                    found.push(value.clone());
                }
            }
        }

        Ok(found)
    }
}
