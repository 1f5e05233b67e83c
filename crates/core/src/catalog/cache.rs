use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PlayerCatalog;

/// Last successfully fetched catalog, kept for offline sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// When the catalog was fetched.
    pub fetched_at: DateTime<Utc>,
    /// The catalog contents.
    pub catalog: PlayerCatalog,
}

impl CatalogSnapshot {
    /// Wrap a freshly fetched catalog.
    pub fn new(catalog: PlayerCatalog) -> Self {
        Self {
            fetched_at: Utc::now(),
            catalog,
        }
    }

    /// Load a snapshot from the given path, returning `None` if it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog snapshot {}", path.display()))?;
        let snapshot = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse catalog snapshot {}", path.display()))?;
        Ok(Some(snapshot))
    }

    /// Persist the snapshot, creating parent directories if needed.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create snapshot directory {}", parent.display())
            })?;
        }

        let serialized =
            serde_json::to_string(self).context("failed to serialize catalog snapshot")?;
        fs::write(path, serialized)
            .with_context(|| format!("failed to write catalog snapshot {}", path.display()))
    }
}

/// Default snapshot path inside a cache directory.
pub fn snapshot_path(cache_root: impl AsRef<Path>) -> PathBuf {
    cache_root.as_ref().join("catalog.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::sample_catalog;
    use tempfile::tempdir;

    #[test]
    fn snapshot_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = snapshot_path(dir.path().join("nested"));
        assert!(CatalogSnapshot::load(&path)?.is_none());

        let snapshot = CatalogSnapshot::new(sample_catalog());
        snapshot.persist(&path)?;

        let restored = CatalogSnapshot::load(&path)?.expect("snapshot should exist");
        assert_eq!(restored.fetched_at, snapshot.fetched_at);
        assert_eq!(restored.catalog.len(), snapshot.catalog.len());
        Ok(())
    }
}
