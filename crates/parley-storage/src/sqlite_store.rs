//! SQLite-backed collections. Each collection is a set of rows in one
//! `snapshots` table, replaced inside a single transaction on save.

use std::marker::PhantomData;
use std::path::Path;
use std::sync::Mutex;

use parley_core::errors::StorageError;
use parley_core::traits::SnapshotStore;
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub struct SqliteStore<T> {
    conn: Mutex<Connection>,
    collection: String,
    _marker: PhantomData<fn() -> T>,
}

fn sqlite_err(context: &str, e: rusqlite::Error) -> StorageError {
    StorageError::Sqlite {
        message: format!("{context}: {e}"),
    }
}

impl<T> SqliteStore<T> {
    pub fn open(path: &Path, collection: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|e| sqlite_err("open", e))?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            ",
        )
        .map_err(|e| sqlite_err("pragmas", e))?;
        Self::with_connection(conn, collection)
    }

    pub fn open_in_memory(collection: &str) -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|e| sqlite_err("open", e))?;
        Self::with_connection(conn, collection)
    }

    fn with_connection(conn: Connection, collection: &str) -> Result<Self, StorageError> {
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            collection: collection.to_string(),
            _marker: PhantomData,
        })
    }
}

fn migrate(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS snapshots (
            collection TEXT NOT NULL,
            position   INTEGER NOT NULL,
            body       TEXT NOT NULL,
            PRIMARY KEY (collection, position)
        );
        ",
    )
    .map_err(|e| sqlite_err("migrate", e))
}

impl<T> SnapshotStore<T> for SqliteStore<T>
where
    T: Serialize + DeserializeOwned,
{
    fn load_all(&self) -> Result<Vec<T>, StorageError> {
        let conn = self.conn.lock().unwrap_or_else(|p| p.into_inner());
        let mut stmt = conn
            .prepare("SELECT body FROM snapshots WHERE collection = ?1 ORDER BY position")
            .map_err(|e| sqlite_err("load prepare", e))?;
        let bodies = stmt
            .query_map(params![self.collection], |row| row.get::<_, String>(0))
            .map_err(|e| sqlite_err("load query", e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| sqlite_err("load row", e))?;

        bodies
            .iter()
            .map(|body| {
                serde_json::from_str(body).map_err(|e| StorageError::Corrupt {
                    path: format!("sqlite:{}", self.collection),
                    details: e.to_string(),
                })
            })
            .collect()
    }

    fn save_all(&self, items: &[T]) -> Result<(), StorageError> {
        let bodies = items
            .iter()
            .map(|item| {
                serde_json::to_string(item).map_err(|e| StorageError::Serialization(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut conn = self.conn.lock().unwrap_or_else(|p| p.into_inner());
        let tx = conn
            .transaction()
            .map_err(|e| sqlite_err("save begin", e))?;
        tx.execute(
            "DELETE FROM snapshots WHERE collection = ?1",
            params![self.collection],
        )
        .map_err(|e| sqlite_err("save clear", e))?;
        {
            let mut insert = tx
                .prepare("INSERT INTO snapshots (collection, position, body) VALUES (?1, ?2, ?3)")
                .map_err(|e| sqlite_err("save prepare", e))?;
            for (position, body) in bodies.iter().enumerate() {
                insert
                    .execute(params![self.collection, position as i64, body])
                    .map_err(|e| sqlite_err("save insert", e))?;
            }
        }
        // Dropping an uncommitted transaction rolls it back.
        tx.commit().map_err(|e| sqlite_err("save commit", e))
    }
}
