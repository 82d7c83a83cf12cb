use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use parley_core::errors::StorageError;
use parley_core::traits::SnapshotStore;

/// Store whose loads and saves can be made to fail on demand.
#[derive(Debug)]
pub struct FlakyStore<T> {
    items: Mutex<Vec<T>>,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl<T> FlakyStore<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            fail_loads: AtomicBool::new(false),
            fail_saves: AtomicBool::new(false),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn corrupt() -> Self {
        let store = Self::new();
        store.fail_loads.store(true, Ordering::SeqCst);
        store
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl<T: Clone> FlakyStore<T> {
    pub fn items(&self) -> Vec<T> {
        self.items.lock().unwrap().clone()
    }
}

impl<T: Clone + Send> SnapshotStore<T> for FlakyStore<T> {
    fn load_all(&self) -> Result<Vec<T>, StorageError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StorageError::Corrupt {
                path: "flaky".into(),
                details: "scripted corruption".into(),
            });
        }
        Ok(self.items.lock().unwrap().clone())
    }

    fn save_all(&self, items: &[T]) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Io {
                path: "flaky".into(),
                message: "scripted write failure".into(),
            });
        }
        *self.items.lock().unwrap() = items.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
