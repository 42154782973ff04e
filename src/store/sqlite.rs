// src/store/sqlite.rs

use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;

use crate::errors::ClientError;
use crate::store::KeyValueStore;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
"#;

// Thread-local connection slot, keyed by path so stores pointing at
// different files can share a thread.
thread_local! {
    static KV_CONN: RefCell<Option<(String, Connection)>> = const { RefCell::new(None) };
}

/// Sqlite-backed key-value store. Cheap to clone (path only); the
/// connection is opened lazily per thread.
#[derive(Clone)]
pub struct SqliteStore {
    path: String,
}

impl SqliteStore {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T, ClientError>
    where
        F: FnOnce(&mut Connection) -> Result<T, ClientError>,
    {
        KV_CONN
            .try_with(|cell| {
                let mut slot = cell.borrow_mut();
                let reopen = match slot.as_ref() {
                    Some((path, _)) => path != &self.path,
                    None => true,
                };
                if reopen {
                    let conn = Connection::open(&self.path)
                        .map_err(|e| ClientError::Storage(format!("open failed: {e}")))?;
                    conn.execute_batch(SCHEMA)
                        .map_err(|e| ClientError::Storage(format!("schema failed: {e}")))?;
                    *slot = Some((self.path.clone(), conn));
                }
                match slot.as_mut() {
                    Some((_, conn)) => f(conn),
                    None => Err(ClientError::Storage("connection slot empty".to_string())),
                }
            })
            .map_err(|e| ClientError::Storage(format!("thread-local access failed: {e}")))?
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .map_err(|e| ClientError::Storage(e.to_string()))
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO kv (key, value) VALUES (?1, ?2)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value
                "#,
                params![key, value],
            )
            .map_err(|e| ClientError::Storage(e.to_string()))?;
            Ok(())
        })
    }
}
