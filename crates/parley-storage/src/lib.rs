//! # parley-storage
//!
//! `SnapshotStore` implementations: JSON files with atomic replace, a SQLite
//! table keyed by collection, and an in-memory store for tests and ephemeral
//! identities.

pub mod json_store;
pub mod memory_store;
pub mod sqlite_store;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parley_core::config::defaults::{DEFAULT_CONTACTS_FILENAME, DEFAULT_SUMMARIES_FILENAME};
use parley_core::config::{StorageBackend, StorageConfig};
use parley_core::errors::StorageError;
use parley_core::models::{Contact, SessionSummary};
use parley_core::traits::SnapshotStore;
use parley_observability::events;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use json_store::JsonFileStore;
pub use memory_store::MemoryStore;
pub use sqlite_store::SqliteStore;

pub(crate) const SQLITE_FILENAME: &str = "parley.db";
pub(crate) const CONTACTS_COLLECTION: &str = "contacts";
pub(crate) const SUMMARIES_COLLECTION: &str = "session_summaries";

/// The two stores one identity persists into.
#[derive(Clone)]
pub struct IdentityStores {
    pub contacts: Arc<dyn SnapshotStore<Contact>>,
    pub summaries: Arc<dyn SnapshotStore<SessionSummary>>,
}

impl std::fmt::Debug for IdentityStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityStores").finish_non_exhaustive()
    }
}

/// Directory holding one identity's persisted state.
pub fn identity_dir(config: &StorageConfig, identity_id: &str) -> PathBuf {
    config.data_dir.join(identity_id)
}

/// Open the configured backend for `identity_id`.
///
/// Never fails: an unusable SQLite database is moved aside and recreated,
/// and if that also fails the identity runs on in-memory stores.
pub fn open_identity_stores(config: &StorageConfig, identity_id: &str) -> IdentityStores {
    let dir = identity_dir(config, identity_id);
    let stores = match config.backend {
        StorageBackend::Json => IdentityStores {
            contacts: Arc::new(JsonFileStore::new(dir.join(DEFAULT_CONTACTS_FILENAME))),
            summaries: Arc::new(JsonFileStore::new(dir.join(DEFAULT_SUMMARIES_FILENAME))),
        },
        StorageBackend::Sqlite => match std::fs::create_dir_all(&dir) {
            Ok(()) => {
                let db = dir.join(SQLITE_FILENAME);
                IdentityStores {
                    contacts: open_sqlite(&db, CONTACTS_COLLECTION),
                    summaries: open_sqlite(&db, SUMMARIES_COLLECTION),
                }
            }
            Err(e) => {
                events::persistence_degraded(&dir.display().to_string(), &io_err(&dir, e).to_string());
                memory_stores()
            }
        },
        StorageBackend::Memory => memory_stores(),
    };
    tracing::debug!(
        identity = %identity_id,
        backend = ?config.backend,
        dir = %dir.display(),
        "identity stores opened"
    );
    stores
}

fn memory_stores() -> IdentityStores {
    IdentityStores {
        contacts: Arc::new(MemoryStore::new()),
        summaries: Arc::new(MemoryStore::new()),
    }
}

/// Open one collection of `db`. A database that cannot be opened is renamed
/// to `<name>.corrupt` and a fresh one created in its place.
fn open_sqlite<T>(db: &Path, collection: &str) -> Arc<dyn SnapshotStore<T>>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    let store_name = format!("{}#{collection}", db.display());
    let first = match SqliteStore::open(db, collection) {
        Ok(store) => return Arc::new(store),
        Err(e) => e,
    };
    events::persistence_degraded(&store_name, &first.to_string());

    if let Err(e) = quarantine(db) {
        events::persistence_degraded(&store_name, &e.to_string());
        return Arc::new(MemoryStore::new());
    }
    match SqliteStore::open(db, collection) {
        Ok(store) => {
            events::persistence_recovered(&store_name);
            Arc::new(store)
        }
        Err(e) => {
            events::persistence_degraded(&store_name, &e.to_string());
            Arc::new(MemoryStore::new())
        }
    }
}

/// Move `db` and its WAL side files out of the way.
fn quarantine(db: &Path) -> Result<(), StorageError> {
    let mut aside = db.as_os_str().to_owned();
    aside.push(".corrupt");
    std::fs::rename(db, PathBuf::from(&aside)).map_err(|e| io_err(db, e))?;
    for suffix in ["-wal", "-shm"] {
        let mut side = db.as_os_str().to_owned();
        side.push(suffix);
        let side = PathBuf::from(side);
        if side.exists() {
            std::fs::remove_file(&side).map_err(|e| io_err(&side, e))?;
        }
    }
    tracing::warn!(db = %db.display(), "unreadable database moved aside");
    Ok(())
}

pub(crate) fn io_err(path: &std::path::Path, e: impl std::fmt::Display) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
