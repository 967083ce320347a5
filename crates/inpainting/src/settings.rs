//! Persisted configuration.
//!
//! The backend base URL is the only persisted setting, stored under a fixed
//! key in a small injected key/value store. The store is a constructor
//! dependency rather than an ambient global so callers (and tests) decide
//! where values live.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;

/// Storage key for the backend base URL.
pub const API_URL_KEY: &str = "api_url";

/// Backend URL used when nothing has been persisted yet.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A minimal persisted key/value store.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError>;
}

/// The configured backend base URL, falling back to [`DEFAULT_API_URL`].
pub fn api_url(store: &dyn SettingsStore) -> String {
    store
        .get(API_URL_KEY)
        .unwrap_or_else(|| DEFAULT_API_URL.to_owned())
}

/// Persist a new backend base URL.
pub fn set_api_url(store: &dyn SettingsStore, url: &str) -> Result<(), SettingsError> {
    store.set(API_URL_KEY, url)
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemorySettings(Mutex<BTreeMap<String, String>>);

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.0.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        if let Ok(mut map) = self.0.lock() {
            map.insert(key.to_owned(), value.to_owned());
        }
        Ok(())
    }
}

/// JSON-file-backed store. The whole file is read on every get and
/// rewritten on every set; the value set is tiny.
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> BTreeMap<String, String> {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.read_map().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        let mut map = self.read_map();
        map.insert(key.to_owned(), value.to_owned());
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&map)?)?;
        debug!(path = %self.path.display(), key, "persisted setting");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_defaults_and_updates() {
        let store = MemorySettings::new();
        assert_eq!(api_url(&store), DEFAULT_API_URL);

        set_api_url(&store, "http://10.0.0.5:8188").expect("Should set");
        assert_eq!(api_url(&store), "http://10.0.0.5:8188");
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let store = FileSettings::new(dir.path().join("settings.json"));

        assert_eq!(api_url(&store), DEFAULT_API_URL);
        set_api_url(&store, "http://example.test:8000").expect("Should persist");

        // A fresh store over the same file sees the persisted value.
        let reopened = FileSettings::new(dir.path().join("settings.json"));
        assert_eq!(api_url(&reopened), "http://example.test:8000");
    }

    #[test]
    fn test_file_store_tolerates_corrupt_file() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json at all").expect("Should write");

        let store = FileSettings::new(&path);
        assert_eq!(api_url(&store), DEFAULT_API_URL);
        set_api_url(&store, "http://fixed.test").expect("Should overwrite");
        assert_eq!(api_url(&store), "http://fixed.test");
    }
}
