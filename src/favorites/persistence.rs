//! Key-value persistence backing the favorite set.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use fs2::FileExt;
use parking_lot::Mutex;
use thiserror::Error;

use crate::catalog::BeerId;

/// Errors reading or writing persisted ids.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// An ordered list of integers per key.
///
/// Calls are synchronous and expected to be short; callers serialise
/// read-modify-write sequences themselves.
pub trait KeyValueStore: Send + Sync {
    /// Ids stored under `key`, empty if the key was never written.
    fn get_ids(&self, key: &str) -> Result<Vec<BeerId>, StoreError>;

    fn set_ids(&self, key: &str, ids: &[BeerId]) -> Result<(), StoreError>;
}

type Document = HashMap<String, Vec<BeerId>>;

/// JSON file of `key -> [ids]`, guarded by an advisory lock on a sibling
/// `.lock` file so separate processes don't clobber each other.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    path: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn ensure_parent_dir(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        Ok(())
    }

    /// Run `f` while holding the lock file. Shared for reads, exclusive for
    /// writes.
    fn with_lock<R>(
        &self,
        exclusive: bool,
        f: impl FnOnce() -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        self.ensure_parent_dir()?;
        let lock_path = self.path.with_extension("lock");
        let lock = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| self.io_error(e))?;

        if exclusive {
            FileExt::lock_exclusive(&lock).map_err(|e| self.io_error(e))?;
        } else {
            FileExt::lock_shared(&lock).map_err(|e| self.io_error(e))?;
        }
        let result = f();
        FileExt::unlock(&lock).map_err(|e| self.io_error(e))?;
        result
    }

    fn read_document(&self) -> Result<Document, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if contents.trim().is_empty() {
            return Ok(Document::new());
        }
        serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write_document(&self, document: &Document) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(document).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("tmp");
        let mut file = File::create(&tmp).map_err(|e| self.io_error(e))?;
        file.write_all(&bytes).map_err(|e| self.io_error(e))?;
        file.sync_all().map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get_ids(&self, key: &str) -> Result<Vec<BeerId>, StoreError> {
        self.with_lock(false, || {
            Ok(self.read_document()?.remove(key).unwrap_or_default())
        })
    }

    fn set_ids(&self, key: &str, ids: &[BeerId]) -> Result<(), StoreError> {
        self.with_lock(true, || {
            let mut document = self.read_document()?;
            document.insert(key.to_string(), ids.to_vec());
            self.write_document(&document)
        })
    }
}

/// In-process store. Counts writes so callers can observe idempotent ones.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<Document>,
    writes: AtomicUsize,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_ids(&self, key: &str) -> Result<Vec<BeerId>, StoreError> {
        Ok(self.values.lock().get(key).cloned().unwrap_or_default())
    }

    fn set_ids(&self, key: &str, ids: &[BeerId]) -> Result<(), StoreError> {
        self.values.lock().insert(key.to_string(), ids.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
