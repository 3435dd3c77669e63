//! Configuration system for the MIPS machine model.
//!
//! This module defines the structures a configuration session edits before a machine
//! is built. It provides:
//! 1. **Defaults:** Baseline values for the core, memory timing and cache geometry.
//! 2. **Structures:** `MachineConfig` aggregating a program cache and a data cache.
//! 3. **Presets:** The fixed `PresetCatalog` and reverse matching of a configuration.
//! 4. **Persistence:** The flat key/value schema used by `MachineConfig::load` and `store`.

/// Cache unit configuration, policies and field identifiers.
pub mod cache;
/// Machine configuration, hazard unit and the cache access guard.
pub mod machine;
/// Persistence schema keys and load/store.
pub mod persist;
/// Preset identifiers and the preset catalog.
pub mod preset;

pub use cache::{CacheConfig, CacheField, CacheUnit, Mutation, ReplacementPolicy, WritePolicy};
pub use machine::{CacheAccess, HazardUnit, MachineConfig};
pub use preset::{Preset, PresetCatalog, PresetId, preset_ids};

/// Default configuration constants for the machine model.
///
/// These values define the machine a fresh session starts from before any preset
/// or stored setting is applied.
pub(crate) mod defaults {
    /// Whether the core is pipelined.
    pub const PIPELINED: bool = false;

    /// Whether branch delay slots are enabled on the non-pipelined core.
    pub const DELAY_SLOT: bool = true;

    /// Raw hazard unit; only takes effect once the core is pipelined.
    pub const HAZARD_UNIT: super::HazardUnit = super::HazardUnit::StallAndForward;

    /// Memory protection against executing from data pages.
    pub const EXEC_PROTECTION: bool = false;

    /// Memory protection against writing to code pages.
    pub const WRITE_PROTECTION: bool = false;

    /// Main memory read access time in cycles.
    pub const MEM_ACCESS_READ: u32 = 10;

    /// Main memory write access time in cycles.
    pub const MEM_ACCESS_WRITE: u32 = 10;

    /// Default number of cache sets.
    pub const CACHE_SETS: u32 = 1;

    /// Default cache block size in words.
    pub const CACHE_BLOCKS: u32 = 1;

    /// Default cache associativity (1 way = direct-mapped).
    pub const CACHE_ASSOCIATIVITY: u32 = 1;

    /// Number of sets used by the cached preset.
    pub const PRESET_CACHE_SETS: u32 = 4;

    /// Block size used by the cached preset.
    pub const PRESET_CACHE_BLOCKS: u32 = 2;

    /// Associativity used by the cached preset.
    pub const PRESET_CACHE_ASSOCIATIVITY: u32 = 2;
}
