//! JSON array file per collection, replaced atomically on every save.

use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use parley_core::errors::StorageError;
use parley_core::traits::SnapshotStore;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::io_err;

pub struct JsonFileStore<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> SnapshotStore<T> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned,
{
    fn load_all(&self) -> Result<Vec<T>, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&self.path, e)),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
            path: self.path.display().to_string(),
            details: e.to_string(),
        })
    }

    /// Writes to a sibling temp file, then renames over the target so readers
    /// never observe a partial file.
    fn save_all(&self, items: &[T]) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;

        let body = serde_json::to_vec_pretty(items)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| io_err(&dir, e))?;
        tmp.write_all(&body).map_err(|e| io_err(tmp.path(), e))?;
        tmp.as_file().sync_all().map_err(|e| io_err(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| io_err(&self.path, e.error))?;
        Ok(())
    }
}
