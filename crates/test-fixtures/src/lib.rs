//! Shared test doubles and golden datasets for Parley integration tests.
//!
//! Collaborator mocks record every call so tests can assert on traffic;
//! golden JSON cases live under `golden/` next to this crate's manifest.

pub mod builders;
pub mod dispatcher;
pub mod store;
pub mod transport;

use std::path::PathBuf;

use serde::de::DeserializeOwned;

pub use builders::*;
pub use dispatcher::ScriptedDispatcher;
pub use store::FlakyStore;
pub use transport::{MockTransport, SentMessage};

/// Root of the golden dataset directory.
fn golden_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("golden")
}

/// Load and deserialize a golden JSON file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = golden_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Get the absolute path to a golden file.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    golden_root().join(relative_path)
}

/// List all JSON files in a golden subdirectory, sorted.
pub fn list_fixtures(subdir: &str) -> Vec<PathBuf> {
    let dir = golden_root().join(subdir);
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}
