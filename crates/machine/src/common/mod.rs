//! Common types used throughout the configuration model.
//!
//! This module collects the pieces shared by the configuration, persistence and
//! construction layers. It includes:
//! 1. **Error Handling:** The structured `ConfigError` returned by validation and persistence.
//! 2. **Field Identifiers:** Small enums naming the offending field inside an error.

/// Error types and field identifiers.
pub mod error;

pub use error::{ConfigError, ElfPathProblem, MemoryTimingField};
