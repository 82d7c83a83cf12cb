use std::sync::Mutex;

use parley_core::errors::StorageError;
use parley_core::traits::SnapshotStore;

/// Process-local store. Contents die with the process.
#[derive(Debug, Default)]
pub struct MemoryStore<T> {
    items: Mutex<Vec<T>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    pub fn with_items(items: Vec<T>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }
}

impl<T: Clone + Send> SnapshotStore<T> for MemoryStore<T> {
    fn load_all(&self) -> Result<Vec<T>, StorageError> {
        let items = self.items.lock().unwrap_or_else(|p| p.into_inner());
        Ok(items.clone())
    }

    fn save_all(&self, items: &[T]) -> Result<(), StorageError> {
        let mut guard = self.items.lock().unwrap_or_else(|p| p.into_inner());
        *guard = items.to_vec();
        Ok(())
    }
}
