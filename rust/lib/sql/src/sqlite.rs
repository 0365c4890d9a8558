use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, ErrorCode};

use crate::error::SQLError;
use crate::traits::{Row, SQLStore, Statement, Value};

/// SqliteStore is a SQLStore implementation backed by rusqlite (bundled SQLite).
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self, SQLError> {
        let conn = Connection::open(path).map_err(|e| SQLError::Connection(e.to_string()))?;

        // WAL for concurrent readers; foreign keys are off by default in SQLite.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        tracing::debug!("opened sqlite database at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite database (useful for tests).
    pub fn open_in_memory() -> Result<Self, SQLError> {
        let conn = Connection::open_in_memory().map_err(|e| SQLError::Connection(e.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| SQLError::Connection(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

/// Convert our Value enum to rusqlite's ToSql.
fn bind_params(params: &[Value]) -> Vec<Box<dyn rusqlite::types::ToSql + '_>> {
    params
        .iter()
        .map(|v| -> Box<dyn rusqlite::types::ToSql + '_> {
            match v {
                Value::Null => Box::new(rusqlite::types::Null),
                Value::Integer(i) => Box::new(*i),
                Value::Real(f) => Box::new(*f),
                Value::Text(s) => Box::new(s.as_str()),
                Value::Blob(b) => Box::new(b.as_slice()),
            }
        })
        .collect()
}

/// Map a write failure, separating constraint violations from other errors.
fn exec_error(e: rusqlite::Error) -> SQLError {
    match e.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => SQLError::Constraint(e.to_string()),
        _ => SQLError::Execution(e.to_string()),
    }
}

fn exec_on(conn: &Connection, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
    let bound = bind_params(params);
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = bound.iter().map(|b| b.as_ref()).collect();

    let affected = conn.execute(sql, param_refs.as_slice()).map_err(exec_error)?;
    Ok(affected as u64)
}

impl SQLStore for SqliteStore {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let bound = bind_params(params);
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            bound.iter().map(|b| b.as_ref()).collect();

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                let mut columns = Vec::with_capacity(column_names.len());
                for (i, name) in column_names.iter().enumerate() {
                    columns.push((name.clone(), row_value_at(row, i)));
                }
                Ok(Row { columns })
            })
            .map_err(|e| SQLError::Query(e.to_string()))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(|e| SQLError::Query(e.to_string()))?);
        }
        Ok(result)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Execution(e.to_string()))?;
        exec_on(&conn, sql, params)
    }

    fn exec_atomic(&self, statements: &[Statement]) -> Result<Vec<u64>, SQLError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        // Dropping the transaction without commit rolls it back.
        let tx = conn
            .transaction()
            .map_err(|e| SQLError::Execution(e.to_string()))?;

        let mut affected = Vec::with_capacity(statements.len());
        for stmt in statements {
            affected.push(exec_on(&tx, &stmt.sql, &stmt.params)?);
        }

        tx.commit().map_err(|e| SQLError::Execution(e.to_string()))?;
        Ok(affected)
    }
}

/// Extract a Value from a rusqlite row at a given column index.
fn row_value_at(row: &rusqlite::Row, idx: usize) -> Value {
    use rusqlite::types::ValueRef;

    match row.get_ref(idx) {
        Ok(ValueRef::Integer(i)) => Value::Integer(i),
        Ok(ValueRef::Real(f)) => Value::Real(f),
        Ok(ValueRef::Text(t)) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        Ok(ValueRef::Blob(b)) => Value::Blob(b.to_vec()),
        Ok(ValueRef::Null) | Err(_) => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_pairs() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .exec(
                "CREATE TABLE pairs (a TEXT NOT NULL, b TEXT NOT NULL, n INTEGER, PRIMARY KEY (a, b))",
                &[],
            )
            .unwrap();
        store
    }

    #[test]
    fn exec_and_query() {
        let store = store_with_pairs();
        let n = store
            .exec(
                "INSERT INTO pairs (a, b, n) VALUES (?1, ?2, ?3)",
                &["x".into(), "y".into(), Value::Integer(7)],
            )
            .unwrap();
        assert_eq!(n, 1);

        let rows = store
            .query("SELECT a, b, n FROM pairs WHERE a = ?1", &["x".into()])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("b"), Some("y"));
        assert_eq!(rows[0].get_i64("n"), Some(7));
    }

    #[test]
    fn duplicate_key_is_constraint_error() {
        let store = store_with_pairs();
        let insert = "INSERT INTO pairs (a, b) VALUES (?1, ?2)";
        store.exec(insert, &["x".into(), "y".into()]).unwrap();

        let err = store.exec(insert, &["x".into(), "y".into()]).unwrap_err();
        assert!(err.is_constraint(), "unexpected error: {err}");

        // INSERT OR IGNORE reports zero rows instead of failing.
        let n = store
            .exec("INSERT OR IGNORE INTO pairs (a, b) VALUES (?1, ?2)", &["x".into(), "y".into()])
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn exec_atomic_commits_all() {
        let store = store_with_pairs();
        let counts = store
            .exec_atomic(&[
                Statement::new("INSERT INTO pairs (a, b) VALUES ('1', '2')", vec![]),
                Statement::new("INSERT INTO pairs (a, b) VALUES ('1', '3')", vec![]),
                Statement::new("DELETE FROM pairs WHERE b = ?1", vec!["9".into()]),
            ])
            .unwrap();
        assert_eq!(counts, vec![1, 1, 0]);

        let rows = store.query("SELECT COUNT(*) AS c FROM pairs", &[]).unwrap();
        assert_eq!(rows[0].get_i64("c"), Some(2));
    }

    #[test]
    fn exec_atomic_rolls_back_on_failure() {
        let store = store_with_pairs();
        let result = store.exec_atomic(&[
            Statement::new("INSERT INTO pairs (a, b) VALUES ('1', '2')", vec![]),
            Statement::new("INSERT INTO pairs (a, b) VALUES ('1', '2')", vec![]),
        ]);
        assert!(result.unwrap_err().is_constraint());

        let rows = store.query("SELECT COUNT(*) AS c FROM pairs", &[]).unwrap();
        assert_eq!(rows[0].get_i64("c"), Some(0));
    }

    #[test]
    fn open_file_backed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.sqlite");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.exec("CREATE TABLE t (v TEXT)", &[]).unwrap();
            store.exec("INSERT INTO t (v) VALUES ('kept')", &[]).unwrap();
        }
        let reopened = SqliteStore::open(&path).unwrap();
        let rows = reopened.query("SELECT v FROM t", &[]).unwrap();
        assert_eq!(rows[0].get_str("v"), Some("kept"));
    }

    #[test]
    fn option_values_bind_as_null() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.exec("CREATE TABLE t (v TEXT)", &[]).unwrap();
        let missing: Option<String> = None;
        store.exec("INSERT INTO t (v) VALUES (?1)", &[missing.into()]).unwrap();
        let rows = store.query("SELECT v FROM t", &[]).unwrap();
        assert_eq!(rows[0].get("v"), Some(&Value::Null));
    }
}
