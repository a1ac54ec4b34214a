/*!
Storage for sealed snapshots.

[`SnapshotStore`] is the port the snapshot engine writes through;
[`LocalFileStore`] keeps snapshots as files and [`MemoryStore`] keeps them in
a map for tests and tooling.
*/

use crate::config::StoreConfig;
use crate::{Result, StatsError};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

/// Byte storage addressed by string paths
pub trait SnapshotStore {
    /// Save snapshot bytes, replacing anything already at `path`
    fn save(&self, data: &[u8], path: &str) -> Result<()>;

    /// Load the bytes saved at `path`
    fn load(&self, path: &str) -> Result<Vec<u8>>;

    /// Check if a snapshot exists at `path`
    fn exists(&self, path: &str) -> bool;

    /// Delete the snapshot at `path`; deleting a missing snapshot succeeds
    fn delete(&self, path: &str) -> Result<()>;
}

/// Local filesystem store
///
/// Parent directories are created on demand and every save goes through a
/// temporary file in the target directory, so readers never observe a
/// half-written snapshot.
#[derive(Debug, Clone, Default)]
pub struct LocalFileStore {
    config: StoreConfig,
}

impl LocalFileStore {
    /// Store that uses paths as given
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that resolves relative paths against `base_dir`
    pub fn with_base_dir<P: AsRef<Path>>(base_dir: P) -> Self {
        Self::from_config(StoreConfig::with_base_dir(base_dir.as_ref()))
    }

    pub fn from_config(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.config.base_dir.as_deref()
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        self.config.resolve(path)
    }

    fn ensure_parent_dir(&self, path: &Path) -> Result<PathBuf> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.exists() {
            fs::create_dir_all(&parent).map_err(|e| {
                StatsError::storage(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        Ok(parent)
    }
}

impl SnapshotStore for LocalFileStore {
    fn save(&self, data: &[u8], path: &str) -> Result<()> {
        let full_path = self.resolve_path(path);
        let parent = self.ensure_parent_dir(&full_path)?;

        let write_err = |e: std::io::Error| {
            StatsError::storage(format!(
                "Failed to write snapshot to {}: {}",
                full_path.display(),
                e
            ))
        };
        let mut staging = NamedTempFile::new_in(&parent).map_err(write_err)?;
        staging.write_all(data).map_err(write_err)?;
        staging.as_file().sync_all().map_err(write_err)?;
        staging
            .persist(&full_path)
            .map_err(|e| write_err(e.error))?;

        debug!(path = %full_path.display(), size = data.len(), "snapshot written");
        Ok(())
    }

    fn load(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve_path(path);
        fs::read(&full_path).map_err(|e| {
            StatsError::storage(format!(
                "Failed to read snapshot from {}: {}",
                full_path.display(),
                e
            ))
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve_path(path).is_file()
    }

    fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.resolve_path(path);
        if full_path.exists() {
            fs::remove_file(&full_path).map_err(|e| {
                StatsError::storage(format!(
                    "Failed to delete snapshot {}: {}",
                    full_path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| StatsError::storage("memory store lock poisoned"))
    }
}

impl SnapshotStore for MemoryStore {
    fn save(&self, data: &[u8], path: &str) -> Result<()> {
        self.lock()?.insert(path.to_string(), data.to_vec());
        Ok(())
    }

    fn load(&self, path: &str) -> Result<Vec<u8>> {
        self.lock()?
            .get(path)
            .cloned()
            .ok_or_else(|| StatsError::storage(format!("No snapshot stored at {path}")))
    }

    fn exists(&self, path: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(path))
            .unwrap_or(false)
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.lock()?.remove(path);
        Ok(())
    }
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for &S {
    fn save(&self, data: &[u8], path: &str) -> Result<()> {
        (**self).save(data, path)
    }

    fn load(&self, path: &str) -> Result<Vec<u8>> {
        (**self).load(path)
    }

    fn exists(&self, path: &str) -> bool {
        (**self).exists(path)
    }

    fn delete(&self, path: &str) -> Result<()> {
        (**self).delete(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_file_store_basic_operations() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::with_base_dir(temp_dir.path());

        let data = b"sealed snapshot";
        let path = "steve.stsn";

        store.save(data, path).unwrap();
        assert!(store.exists(path));
        assert_eq!(store.load(path).unwrap(), data);

        store.delete(path).unwrap();
        assert!(!store.exists(path));
        // deleting again is fine
        store.delete(path).unwrap();
    }

    #[test]
    fn test_local_file_store_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::with_base_dir(temp_dir.path());

        let path = "worlds/overworld/players/alex.stsn";
        store.save(b"data", path).unwrap();
        assert!(temp_dir.path().join(path).is_file());
    }

    #[test]
    fn test_local_file_store_replaces_existing() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::with_base_dir(temp_dir.path());

        store.save(b"first version", "a.stsn").unwrap();
        store.save(b"second", "a.stsn").unwrap();
        assert_eq!(store.load("a.stsn").unwrap(), b"second");

        // no staging files left behind
        let leftovers = fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_local_file_store_absolute_path_ignores_base() {
        let base = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let store = LocalFileStore::with_base_dir(base.path());

        let target = other.path().join("abs.stsn");
        let target = target.to_str().unwrap();
        store.save(b"abs", target).unwrap();
        assert_eq!(fs::read(target).unwrap(), b"abs");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileStore::with_base_dir(temp_dir.path());
        assert!(matches!(
            store.load("missing.stsn"),
            Err(StatsError::Storage(_))
        ));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.save(b"one", "a").unwrap();
        assert!(store.exists("a"));
        assert_eq!(store.load("a").unwrap(), b"one");
        assert_eq!(store.len(), 1);

        store.delete("a").unwrap();
        assert!(!store.exists("a"));
        assert!(store.load("a").is_err());
    }
}
