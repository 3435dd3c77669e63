//! Configuration error definitions.
//!
//! Every failure the model can report is a `ConfigError`. Errors are structured
//! (kind, offending field, optional path) so a presenter can build its own message;
//! the `Display` output is a plain English fallback.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::{CacheField, CacheUnit};
use crate::store::StoreError;

/// Reason an ELF path was rejected by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfPathProblem {
    /// No path was configured, or the path is the empty string.
    Empty,
    /// Nothing exists at the path.
    Missing,
    /// The path exists but is a directory or other non-regular file.
    NotAFile,
    /// The file exists but could not be opened for reading.
    Unreadable,
}

impl fmt::Display for ElfPathProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Empty => "no executable selected",
            Self::Missing => "file does not exist",
            Self::NotAFile => "not a regular file",
            Self::Unreadable => "file is not readable",
        };
        f.write_str(text)
    }
}

/// Memory timing field named by an `InvalidMemoryTiming` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryTimingField {
    /// `memory_access_time_read`.
    Read,
    /// `memory_access_time_write`.
    Write,
}

impl fmt::Display for MemoryTimingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// Errors produced by validation, preset lookup and persistence.
///
/// All variants are recoverable. Validation errors leave the configuration
/// untouched; store errors never roll back in-memory state.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The executable path is empty, missing, not a file or unreadable.
    #[error("invalid ELF path {}: {}", .path.display(), .reason)]
    InvalidElfPath {
        /// The offending path (empty when none was configured).
        path: PathBuf,
        /// Why the path was rejected.
        reason: ElfPathProblem,
    },

    /// An enabled cache has a zero-sized geometry field.
    #[error("invalid {unit} cache configuration: {field} must be at least 1")]
    InvalidCacheConfig {
        /// Which cache unit failed.
        unit: CacheUnit,
        /// The first field found to be invalid.
        field: CacheField,
    },

    /// A memory access time could not be represented in the model.
    #[error("memory {field} access time is out of range")]
    InvalidMemoryTiming {
        /// Which timing field failed.
        field: MemoryTimingField,
    },

    /// Reading a key from the configuration store failed.
    #[error("failed to read `{key}` from the configuration store")]
    StoreRead {
        /// The schema key being read.
        key: String,
        /// Underlying store failure.
        #[source]
        source: StoreError,
    },

    /// Writing a key to the configuration store failed.
    #[error("failed to write `{key}` to the configuration store")]
    StoreWrite {
        /// The schema key being written.
        key: String,
        /// Underlying store failure.
        #[source]
        source: StoreError,
    },

    /// A write policy was set on a cache unit that never writes.
    #[error("the {unit} cache is read-only and has no write policy")]
    NoWritePolicy {
        /// The read-only cache unit.
        unit: CacheUnit,
    },

    /// A persisted preset number does not name any catalog entry.
    #[error("unknown preset id {0}")]
    UnknownPresetId(u64),
}

impl ConfigError {
    /// Returns true for errors raised by `MachineConfig::validate`.
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidElfPath { .. }
                | Self::InvalidCacheConfig { .. }
                | Self::InvalidMemoryTiming { .. }
        )
    }
}
