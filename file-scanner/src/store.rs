//! Watch list storage and persistence.
//!
//! The watch list is a single table of `{ id, path }` records. Paths are
//! unique; uniqueness is enforced by checking before every insert under the
//! same lock, not by the storage format. The durable store locks a file next
//! to the document, so the check holds across handles and processes.
//!
//! Storage failures never reach callers. Reads degrade to an empty list and
//! writes are dropped, both with a warning.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_STORE_DIR;
use crate::error::{Result, ScanError, StorageError};

/// File name of the persisted watch list inside the store directory.
pub const WATCH_LIST_FILE: &str = "watched_dirs.json";

/// Advisory lock file guarding [`WATCH_LIST_FILE`].
pub const WATCH_LIST_LOCK_FILE: &str = "watched_dirs.lock";

/// A directory persisted so that future scans include it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedDirectory {
    /// Auto-incremented identifier, never reused.
    pub id: u64,

    /// Absolute path to the directory.
    pub path: String,
}

/// Storage backend for watched directories.
///
/// Every method is atomic with respect to the others on the same store.
pub trait WatchListStore: Send + Sync {
    /// Persist `path` unless it is empty or already present.
    fn insert(&self, path: &str);

    /// Delete every record whose path equals `path`.
    fn remove(&self, path: &str);

    /// Check whether `path` is already watched.
    fn contains(&self, path: &str) -> bool;

    /// Every stored record, oldest first. Empty if the store is unreachable.
    fn entries(&self) -> Vec<WatchedDirectory>;

    /// Every stored path. Callers must not rely on the order.
    fn all_paths(&self) -> Vec<String> {
        self.entries().into_iter().map(|entry| entry.path).collect()
    }

    /// Number of watched directories.
    fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether nothing is watched.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// On-disk format of the watch list.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WatchListData {
    /// Version of the storage format.
    version: u32,

    /// Next identifier to hand out.
    next_id: u64,

    /// Stored records.
    entries: Vec<WatchedDirectory>,
}

impl WatchListData {
    const CURRENT_VERSION: u32 = 1;

    fn contains(&self, path: &str) -> bool {
        self.entries.iter().any(|entry| entry.path == path)
    }

    /// Returns `true` if a record was added.
    fn insert(&mut self, path: &str) -> bool {
        if path.is_empty() || self.contains(path) {
            return false;
        }

        self.entries.push(WatchedDirectory {
            id: self.next_id,
            path: path.to_string(),
        });
        self.next_id += 1;
        true
    }

    /// Returns `true` if at least one record was removed.
    fn remove(&mut self, path: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.path != path);
        self.entries.len() != before
    }
}

impl Default for WatchListData {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            next_id: 1,
            entries: Vec::new(),
        }
    }
}

/// Durable watch list kept as a JSON document.
///
/// The document is read at the start of every operation and replaced
/// atomically (unique temp file, then rename) after every mutation. Each
/// operation holds an advisory lock on [`WATCH_LIST_LOCK_FILE`]: exclusive
/// across load, mutate and save, shared for reads. Any number of handles,
/// in this process or others, can share one directory.
pub struct JsonWatchListStore {
    /// Directory holding the document, its lock file and temp files.
    dir: PathBuf,

    /// Path of the watch list document.
    file_path: PathBuf,

    /// Path of the advisory lock file.
    lock_path: PathBuf,
}

#[derive(Debug, Clone, Copy)]
enum LockMode {
    Shared,
    Exclusive,
}

impl JsonWatchListStore {
    /// Open (or create) a store in `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();

        fs::create_dir_all(dir)
            .map_err(|e| StorageError::CreateDirectory(format!("{}: {e}", dir.display())))?;

        let store = Self {
            dir: dir.to_path_buf(),
            file_path: dir.join(WATCH_LIST_FILE),
            lock_path: dir.join(WATCH_LIST_LOCK_FILE),
        };

        info!("Opened watch list at {}", store.file_path.display());
        Ok(store)
    }

    /// Open a store in the default location (~/.extscan).
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir().ok_or(ScanError::NoHomeDirectory)?;
        Self::open(home.join(DEFAULT_STORE_DIR))
    }

    /// Path of the watch list document.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Acquire the lock file. The lock is released when the returned file is dropped.
    fn lock(&self, mode: LockMode) -> std::result::Result<File, StorageError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| StorageError::Lock(format!("{}: {e}", self.lock_path.display())))?;

        let locked = match mode {
            LockMode::Shared => FileExt::lock_shared(&file),
            LockMode::Exclusive => FileExt::lock_exclusive(&file),
        };
        locked.map_err(|e| StorageError::Lock(format!("{}: {e}", self.lock_path.display())))?;

        Ok(file)
    }

    fn load(&self) -> std::result::Result<WatchListData, StorageError> {
        let content = match fs::read_to_string(&self.file_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(WatchListData::default()),
            Err(e) => {
                return Err(StorageError::ReadFile(format!(
                    "{}: {e}",
                    self.file_path.display()
                )));
            }
        };

        let data: WatchListData = serde_json::from_str(&content).map_err(|e| {
            StorageError::InvalidFormat(format!("{}: {e}", self.file_path.display()))
        })?;

        if data.version != WatchListData::CURRENT_VERSION {
            warn!(
                "Watch list version mismatch: found {}, expected {}",
                data.version,
                WatchListData::CURRENT_VERSION
            );
        }

        Ok(data)
    }

    fn save(&self, data: &WatchListData) -> std::result::Result<(), StorageError> {
        let content = serde_json::to_string_pretty(data)
            .map_err(|e| StorageError::InvalidFormat(format!("failed to serialize: {e}")))?;

        let mut temp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| StorageError::WriteFile(format!("{}: {e}", self.dir.display())))?;
        temp.write_all(content.as_bytes())
            .map_err(|e| StorageError::WriteFile(format!("{}: {e}", temp.path().display())))?;

        temp.persist(&self.file_path)
            .map_err(|e| StorageError::WriteFile(format!("{}: {e}", self.file_path.display())))?;

        Ok(())
    }

    /// Read the document under a shared lock.
    fn read(&self) -> std::result::Result<WatchListData, StorageError> {
        let _lock = self.lock(LockMode::Shared)?;
        self.load()
    }

    /// Load, apply `mutate`, and save if it reported a change, all under
    /// the exclusive lock.
    fn update(&self, op: &str, path: &str, mutate: impl FnOnce(&mut WatchListData) -> bool) {
        let _lock = match self.lock(LockMode::Exclusive) {
            Ok(lock) => lock,
            Err(e) => {
                warn!("Skipping watch list {op} of {path}: {e}");
                return;
            }
        };

        let mut data = match self.load() {
            Ok(data) => data,
            Err(e) => {
                warn!("Skipping watch list {op} of {path}: {e}");
                return;
            }
        };

        if !mutate(&mut data) {
            return;
        }

        match self.save(&data) {
            Ok(()) => debug!("Watch list {op}: {path}"),
            Err(e) => warn!("Failed to persist watch list {op} of {path}: {e}"),
        }
    }
}

impl WatchListStore for JsonWatchListStore {
    fn insert(&self, path: &str) {
        if path.is_empty() {
            return;
        }
        self.update("insert", path, |data| data.insert(path));
    }

    fn remove(&self, path: &str) {
        if path.is_empty() {
            return;
        }
        self.update("remove", path, |data| data.remove(path));
    }

    fn contains(&self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }
        match self.read() {
            Ok(data) => data.contains(path),
            Err(e) => {
                warn!("Failed to read watch list: {e}");
                false
            }
        }
    }

    fn entries(&self) -> Vec<WatchedDirectory> {
        match self.read() {
            Ok(data) => data.entries,
            Err(e) => {
                warn!("Failed to read watch list: {e}");
                Vec::new()
            }
        }
    }
}

/// Non-durable watch list with the same semantics as [`JsonWatchListStore`].
#[derive(Default)]
pub struct MemoryWatchListStore {
    data: Mutex<WatchListData>,
}

impl MemoryWatchListStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl WatchListStore for MemoryWatchListStore {
    fn insert(&self, path: &str) {
        if self.data.lock().insert(path) {
            debug!("Watch list insert: {path}");
        }
    }

    fn remove(&self, path: &str) {
        if self.data.lock().remove(path) {
            debug!("Watch list remove: {path}");
        }
    }

    fn contains(&self, path: &str) -> bool {
        !path.is_empty() && self.data.lock().contains(path)
    }

    fn entries(&self) -> Vec<WatchedDirectory> {
        self.data.lock().entries.clone()
    }
}
