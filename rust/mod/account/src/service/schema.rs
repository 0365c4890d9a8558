use recharge_sql::SQLStore;

use crate::service::AccountError;

/// Initialize the SQLite schema for accounts and their recovery tokens.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), AccountError> {
    let statements = [
        // Password hash is NULL for social accounts.
        "CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY,
            password_hash TEXT,
            user_name TEXT NOT NULL,
            user_nickname TEXT NOT NULL UNIQUE,
            user_email TEXT NOT NULL UNIQUE,
            user_role TEXT NOT NULL,
            social_id TEXT UNIQUE,
            social_type TEXT,
            device_os TEXT,
            device_version TEXT,
            fcm_token TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_users_name_email ON users(user_name, user_email)",

        // One pending code per address; expires_at is a unix timestamp.
        "CREATE TABLE IF NOT EXISTS email_verifications (
            email TEXT PRIMARY KEY,
            code TEXT NOT NULL,
            expires_at INTEGER NOT NULL,
            verified INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",

        "CREATE TABLE IF NOT EXISTS password_resets (
            token TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            expires_at INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(user_id) ON DELETE CASCADE
        )",
        "CREATE INDEX IF NOT EXISTS idx_password_resets_user ON password_resets(user_id)",
    ];

    for stmt in &statements {
        sql.exec(stmt, &[])
            .map_err(|e| AccountError::Storage(format!("schema init failed: {}", e)))?;
    }

    Ok(())
}
