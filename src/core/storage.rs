//! Device-local key/value storage for the cart and wishlist.
//!
//! Values are strings, like a browser's local storage. [`FileStorage`] keeps all keys
//! in one JSON object on disk and rewrites the file on every `set`; [`MemoryStorage`]
//! is the in-process stand-in used by tests.

use crate::errors::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

/// Minimal string key/value storage owned by a single client session.
pub trait LocalStorage {
    /// Returns the stored value for `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

fn poisoned() -> Error {
    Error::Storage {
        message: "storage lock poisoned".to_string(),
    }
}

/// In-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Storage backed by a single JSON file.
///
/// The file is read once on open and written through on every `set`.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens (or prepares to create) the storage file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read. A file that is not a
    /// JSON object of strings is logged and treated as empty; the next `set`
    /// overwrites it.
    #[instrument]
    pub fn open(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let contents = fs::read_to_string(path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents).unwrap_or_else(|e| {
                    warn!("Ignoring unreadable local storage file: {}", e);
                    BTreeMap::new()
                })
            }
        } else {
            BTreeMap::new()
        };
        debug!("Opened local storage with {} key(s)", entries.len());

        Ok(Self {
            path: path.to_path_buf(),
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        let previous = entries.insert(key.to_string(), value.to_string());

        if let Err(e) = self.write(&entries) {
            // keep memory in line with what is on disk
            match previous {
                Some(previous) => entries.insert(key.to_string(), previous),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}
