use recharge_sql::SQLStore;

use crate::service::SocialError;

/// Initialize the SQLite schema for the social tables.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), SocialError> {
    let statements = [
        // Follow edges: the composite key is the only uniqueness guard.
        "CREATE TABLE IF NOT EXISTS follows (
            follower_id TEXT NOT NULL,
            following_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (follower_id, following_id)
        )",
        "CREATE INDEX IF NOT EXISTS idx_follows_following ON follows(following_id)",

        "CREATE TABLE IF NOT EXISTS bookmarks (
            user_id TEXT NOT NULL,
            target_type TEXT NOT NULL,
            target_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (user_id, target_type, target_id)
        )",

        // Counter cache, one row per user.
        "CREATE TABLE IF NOT EXISTS user_feeds (
            user_id TEXT PRIMARY KEY,
            total_count INTEGER NOT NULL DEFAULT 0,
            follower_count INTEGER NOT NULL DEFAULT 0,
            following_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",

        "CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author_id TEXT NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id)",

        "CREATE TABLE IF NOT EXISTS notifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id TEXT NOT NULL,
            source_type TEXT NOT NULL,
            recipient_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            title TEXT NOT NULL,
            read INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_notifications_recipient ON notifications(recipient_id)",
    ];

    for stmt in &statements {
        sql.exec(stmt, &[])
            .map_err(|e| SocialError::Storage(e.to_string()))?;
    }

    Ok(())
}
