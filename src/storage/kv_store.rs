// Durable key-value storage for automation configs, run flags and status
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

pub const CONFIGS_KEY: &str = "spacetraders-automation-configs";
pub const RUNNING_KEY: &str = "spacetraders-automation-running";
pub const STATUS_KEY: &str = "spacetraders-automation-status";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Raw string storage keyed by name. Reads never fail: anything missing or
/// unreadable is reported as absent.
pub trait KeyValueStore: Send + Sync {
    fn read_raw(&self, key: &str) -> Option<String>;

    fn write_raw(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Reads a ship-symbol keyed map. Missing or corrupt data yields an empty map.
pub fn read_map<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> HashMap<String, T> {
    let Some(raw) = store.read_raw(key) else {
        return HashMap::new();
    };

    match serde_json::from_str(&raw) {
        Ok(map) => map,
        Err(e) => {
            warn!(key, error = %e, "⚠️ Discarding unreadable automation data");
            HashMap::new()
        }
    }
}

pub fn write_map<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    map: &HashMap<String, T>,
) -> Result<(), StorageError> {
    let content = serde_json::to_string_pretty(map).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.write_raw(key, &content)
}

/// One pretty-printed JSON file per key under a storage directory.
pub struct JsonFileStore {
    directory: PathBuf,
}

impl JsonFileStore {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}.json", key))
    }
}

impl KeyValueStore for JsonFileStore {
    fn read_raw(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        if !path.exists() {
            return None; // File doesn't exist yet, start fresh
        }

        match fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "⚠️ Failed to read automation storage");
                None
            }
        }
    }

    fn write_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let io_error = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };

        fs::create_dir_all(&self.directory).map_err(io_error)?;
        fs::write(self.path_for(key), value).map_err(io_error)
    }
}

/// Process-local store, used when nothing needs to survive a restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read_raw(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn write_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
