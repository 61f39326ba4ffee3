//! File-backed key-value store.
//!
//! One JSON object per store file. Every mutation rewrites the whole file
//! through a staging file + rename, so a crash mid-write leaves the
//! previous snapshot intact.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::boundary::{KeyValueStore, PersistenceError};

pub struct FileKvStore {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
}

impl FileKvStore {
    /// Open the store, creating parent directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let values = if path.exists() {
            let json = fs::read_to_string(&path)?;
            serde_json::from_str(&json)
                .map_err(|e| PersistenceError(format!("store file corrupt: {e}")))?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &HashMap<String, String>) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(values)
            .map_err(|e| PersistenceError(e.to_string()))?;
        let staging = self.path.with_extension("staging");
        {
            let mut file = File::create(&staging)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&staging, &self.path)?;
        if let Some(parent) = self.path.parent() {
            fsync_dir(parent)?;
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.values.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut next = self.values.read().clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *self.values.write() = next;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), PersistenceError> {
        let next = {
            let guard = self.values.read();
            if !guard.contains_key(key) {
                return Ok(());
            }
            let mut next = guard.clone();
            next.remove(key);
            next
        };
        self.persist(&next)?;
        *self.values.write() = next;
        Ok(())
    }
}

fn fsync_dir(path: &Path) -> Result<(), PersistenceError> {
    #[cfg(unix)]
    {
        let dir = OpenOptions::new().read(true).open(path)?;
        dir.sync_all()?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
