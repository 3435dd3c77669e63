//! Key/value persistence backends.
//!
//! The configuration model defines the schema (see `config::persist`); a store only
//! supplies typed get/set over a flat key namespace. This module provides:
//! 1. **Boundary:** The `ConfigStore` trait and the `StoreValue` cell type.
//! 2. **Memory:** `MemoryStore`, an in-process map.
//! 3. **File:** `JsonFileStore`, a flat JSON object on disk.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON file backend.
pub mod json;
/// In-memory backend.
pub mod memory;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

/// Persistence medium the configuration is loaded from and stored to.
///
/// Implementations are not expected to understand the schema. A missing key is
/// `Ok(None)`, never an error.
pub trait ConfigStore {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Backend-specific failures.
    fn get(&self, key: &str) -> Result<Option<StoreValue>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Backend-specific failures.
    fn set(&mut self, key: &str, value: StoreValue) -> Result<(), StoreError>;

    /// Makes previous writes durable. Stores without a backing medium do nothing.
    ///
    /// # Errors
    ///
    /// Backend-specific failures.
    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// A single stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreValue {
    /// Boolean flag.
    Bool(bool),
    /// Unsigned integer (counts, cycle times, enum codes).
    UInt(u64),
    /// Text (paths).
    Str(String),
}

/// Type tag of a `StoreValue`, used in mismatch errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// `StoreValue::Bool`.
    Bool,
    /// `StoreValue::UInt`.
    UInt,
    /// `StoreValue::Str`.
    Str,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("boolean"),
            Self::UInt => f.write_str("unsigned integer"),
            Self::Str => f.write_str("string"),
        }
    }
}

impl StoreValue {
    /// Type tag of this value.
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::UInt(_) => ValueKind::UInt,
            Self::Str(_) => ValueKind::Str,
        }
    }

    /// The boolean payload, if this is a `Bool`.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// The integer payload, if this is a `UInt`.
    pub const fn as_uint(&self) -> Option<u64> {
        match self {
            Self::UInt(value) => Some(*value),
            _ => None,
        }
    }

    /// The text payload, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// The boolean payload, or a `TypeMismatch` naming `key`.
    ///
    /// # Errors
    ///
    /// `StoreError::TypeMismatch` when the value is not a `Bool`.
    pub fn require_bool(&self, key: &str) -> Result<bool, StoreError> {
        self.as_bool()
            .ok_or_else(|| self.mismatch(key, ValueKind::Bool))
    }

    /// The integer payload, or a `TypeMismatch` naming `key`.
    ///
    /// # Errors
    ///
    /// `StoreError::TypeMismatch` when the value is not a `UInt`.
    pub fn require_uint(&self, key: &str) -> Result<u64, StoreError> {
        self.as_uint()
            .ok_or_else(|| self.mismatch(key, ValueKind::UInt))
    }

    /// The text payload, or a `TypeMismatch` naming `key`.
    ///
    /// # Errors
    ///
    /// `StoreError::TypeMismatch` when the value is not a `Str`.
    pub fn require_str(&self, key: &str) -> Result<&str, StoreError> {
        self.as_str()
            .ok_or_else(|| self.mismatch(key, ValueKind::Str))
    }

    fn mismatch(&self, key: &str, expected: ValueKind) -> StoreError {
        StoreError::TypeMismatch {
            key: key.to_owned(),
            expected,
            found: self.kind(),
        }
    }
}

impl From<bool> for StoreValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<u64> for StoreValue {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<u32> for StoreValue {
    fn from(value: u32) -> Self {
        Self::UInt(u64::from(value))
    }
}

impl From<String> for StoreValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for StoreValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

/// Failures reported by store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The backing file is not a flat JSON object of store values.
    #[error("malformed configuration file {}: {source}", .path.display())]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A key holds a value of the wrong type.
    #[error("key `{key}` holds a {found} value, expected {expected}")]
    TypeMismatch {
        /// The key read.
        key: String,
        /// Type the schema requires.
        expected: ValueKind,
        /// Type actually stored.
        found: ValueKind,
    },

    /// A key holds an integer outside the set of valid codes.
    #[error("key `{key}` holds unsupported value {value}")]
    InvalidValue {
        /// The key read.
        key: String,
        /// The offending value.
        value: u64,
    },

    /// Any other backend failure.
    #[error("store backend failure: {0}")]
    Backend(String),
}
