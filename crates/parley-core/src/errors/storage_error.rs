//! Persistence errors. Never fatal: callers log and keep in-memory state.

use super::error_code::{self, ParleyErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("corrupt store {path}: {details}")]
    Corrupt { path: String, details: String },

    #[error("SQLite error: {message}")]
    Sqlite { message: String },

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ParleyErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        error_code::STORAGE_ERROR
    }
}
