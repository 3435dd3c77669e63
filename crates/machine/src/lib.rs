//! Machine configuration model for the MIPS simulator.
//!
//! This crate describes the machine a simulator session is about to build. It provides:
//! 1. **Configuration:** `MachineConfig` and its two `CacheConfig` units, with cross-field rules.
//! 2. **Presets:** A fixed catalog of named machines and reverse lookup from a configuration.
//! 3. **Persistence:** A flat key/value schema over any `ConfigStore` (in memory or JSON file).
//! 4. **Construction:** ELF probing and a `ConfigSession` that validates, builds and persists.
//!
//! The model never runs a machine; it only decides whether one can be built.

/// Error types shared across the configuration model.
pub mod common;
/// Configuration structures (caches, machine, presets, persistence schema).
pub mod config;
/// Machine construction (ELF probe) and configuration sessions.
pub mod sim;
/// Key/value persistence backends.
pub mod store;

/// Structured configuration error returned by validation and persistence.
pub use crate::common::ConfigError;
/// Root configuration type; start from `MachineConfig::default()` or `MachineConfig::load`.
pub use crate::config::MachineConfig;
/// Session owning a configuration and the store it is persisted to.
pub use crate::sim::ConfigSession;
/// Persistence boundary implemented by every store backend.
pub use crate::store::ConfigStore;
