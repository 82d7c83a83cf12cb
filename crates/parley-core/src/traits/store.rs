use crate::errors::StorageError;

/// Load-all / save-all persistence for one collection.
///
/// `save_all` replaces the whole collection atomically. A missing store
/// loads as empty.
pub trait SnapshotStore<T>: Send + Sync {
    fn load_all(&self) -> Result<Vec<T>, StorageError>;
    fn save_all(&self, items: &[T]) -> Result<(), StorageError>;
}
