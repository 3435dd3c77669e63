//! JSON file configuration store.
//!
//! The file holds one flat JSON object whose values are booleans, unsigned integers
//! or strings. Writes are buffered in memory until `flush`, which replaces the file
//! atomically (write to a sibling temporary file, then rename).

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{ConfigStore, StoreError, StoreValue};

/// A `ConfigStore` persisted as a JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, StoreValue>,
    dirty: bool,
}

impl JsonFileStore {
    /// Opens the store at `path`.
    ///
    /// A missing or empty file is an empty store; it is created on the first flush.
    ///
    /// # Errors
    ///
    /// `StoreError::Io` when the file exists but cannot be read,
    /// `StoreError::Parse` when it is not a flat object of store values.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values: BTreeMap<String, StoreValue> = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        tracing::debug!(path = %path.display(), keys = values.len(), "opened configuration store");
        Ok(Self {
            path,
            values,
            dirty: false,
        })
    }

    /// Opens the store at `path`, starting empty if it is unreadable or corrupt.
    ///
    /// A corrupt file is overwritten on the next flush.
    pub fn open_or_empty(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::open(path.clone()).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "ignoring unusable configuration store");
            Self::empty(path)
        })
    }

    /// An empty store that will be written to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            values: BTreeMap::new(),
            dirty: false,
        }
    }

    /// File this store reads from and writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether there are writes not yet flushed.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ConfigStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<StoreValue>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: StoreValue) -> Result<(), StoreError> {
        if self.values.get(key) != Some(&value) {
            let _ = self.values.insert(key.to_owned(), value);
            self.dirty = true;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty && self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }

        let text = serde_json::to_string_pretty(&self.values).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        let temp = self.temp_path();
        fs::write(&temp, text).map_err(|source| self.io_error(source))?;
        fs::rename(&temp, &self.path).map_err(|source| self.io_error(source))?;

        self.dirty = false;
        tracing::debug!(
            path = %self.path.display(),
            keys = self.values.len(),
            "flushed configuration store"
        );
        Ok(())
    }
}
