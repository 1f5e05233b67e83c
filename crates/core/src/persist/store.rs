use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Synchronous string key/value storage.
pub trait KeyValueStore: Send {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Write a value, replacing any previous one.
    fn set(&mut self, key: &str, value: String) -> Result<()>;
    /// Delete a value. Deleting an absent key succeeds.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// File name of the store inside its root directory.
pub const STORE_FILE: &str = "squad.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    values: BTreeMap<String, String>,
}

/// Store backed by a single JSON file that is rewritten on every change.
pub struct FileStore {
    path: PathBuf,
    contents: StoreFile,
}

impl FileStore {
    /// Open (or lazily create) the store under `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let path = root.as_ref().join(STORE_FILE);
        let contents = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            StoreFile::default()
        };
        Ok(Self { path, contents })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the store was last written.
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.contents.saved_at
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        self.contents.saved_at = Some(Utc::now());
        let serialised = serde_json::to_vec_pretty(&self.contents)?;
        fs::write(&self.path, serialised)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.contents.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.contents.values.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.contents.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// In-memory store. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_store_writes_through() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path().join("state");
        let mut store = FileStore::open(&root)?;
        assert!(store.get("captain_id")?.is_none());
        assert!(!store.path().exists());

        store.set("captain_id", "12".to_string())?;
        assert!(store.path().exists());
        assert!(store.saved_at().is_some());

        let reopened = FileStore::open(&root)?;
        assert_eq!(reopened.get("captain_id")?.as_deref(), Some("12"));

        store.remove("captain_id")?;
        let reopened = FileStore::open(&root)?;
        assert!(reopened.get("captain_id")?.is_none());
        Ok(())
    }

    #[test]
    fn corrupt_file_is_reported() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join(STORE_FILE), "{not json")?;
        assert!(FileStore::open(dir.path()).is_err());
        Ok(())
    }

    #[test]
    fn memory_store_clones_share_state() -> Result<()> {
        let mut store = MemoryStore::new();
        let view = store.clone();
        store.set("k", "v".to_string())?;
        assert_eq!(view.get("k")?.as_deref(), Some("v"));
        assert_eq!(view.len(), 1);
        Ok(())
    }
}
