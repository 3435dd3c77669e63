//! Machine configuration.
//!
//! `MachineConfig` is edited in place for the lifetime of a configuration session.
//! Its fields are private: every change goes through a setter so the model can track
//! whether the configuration still corresponds to the preset it was built from.
//!
//! Two fields are governed by `pipelined`:
//! - while pipelined, the delay slot is implied by the pipeline and the stored value is ignored;
//! - while not pipelined, there is no hazard unit and the stored value is ignored.
//!
//! The raw values are kept so that toggling pipelining back restores what the user chose.
//! Downstream consumers read `effective_delay_slot` and `effective_hazard_unit`.

use std::fmt;
use std::fs::{self, File};
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::cache::{CacheConfig, CacheUnit, Mutation, ReplacementPolicy, WritePolicy};
use super::defaults;
use super::preset::{PresetCatalog, PresetId};
use crate::common::{ConfigError, ElfPathProblem};

/// Pipeline hazard handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum HazardUnit {
    /// No hazard unit; the program is responsible for avoiding hazards.
    #[default]
    None,
    /// Stall the pipeline until the hazard resolves.
    Stall,
    /// Forward results where possible and stall otherwise.
    #[serde(alias = "StallForward")]
    StallAndForward,
}

impl HazardUnit {
    /// All variants in persistence order.
    pub const ALL: [Self; 3] = [Self::None, Self::Stall, Self::StallAndForward];

    /// Integer code used by the persistence schema.
    pub const fn code(self) -> u64 {
        match self {
            Self::None => 0,
            Self::Stall => 1,
            Self::StallAndForward => 2,
        }
    }

    /// Decodes a persisted code.
    pub const fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Stall),
            2 => Some(Self::StallAndForward),
            _ => None,
        }
    }
}

impl fmt::Display for HazardUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Stall => f.write_str("stall"),
            Self::StallAndForward => f.write_str("stall and forward"),
        }
    }
}

/// Root description of the machine to build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    #[serde(default)]
    elf_path: Option<PathBuf>,

    #[serde(default)]
    pipelined: bool,

    #[serde(default = "MachineConfig::default_delay_slot")]
    delay_slot: bool,

    #[serde(default = "MachineConfig::default_hazard_unit")]
    hazard_unit: HazardUnit,

    #[serde(default)]
    memory_execute_protection: bool,

    #[serde(default)]
    memory_write_protection: bool,

    #[serde(default = "MachineConfig::default_access_time_read")]
    memory_access_time_read: u32,

    #[serde(default = "MachineConfig::default_access_time_write")]
    memory_access_time_write: u32,

    #[serde(default)]
    cache_program: CacheConfig,

    #[serde(default)]
    cache_data: CacheConfig,

    #[serde(skip)]
    is_custom: bool,
}

impl MachineConfig {
    /// Returns the default raw delay slot setting.
    const fn default_delay_slot() -> bool {
        defaults::DELAY_SLOT
    }

    /// Returns the default raw hazard unit.
    const fn default_hazard_unit() -> HazardUnit {
        defaults::HAZARD_UNIT
    }

    /// Returns the default read access time in cycles.
    const fn default_access_time_read() -> u32 {
        defaults::MEM_ACCESS_READ
    }

    /// Returns the default write access time in cycles.
    const fn default_access_time_write() -> u32 {
        defaults::MEM_ACCESS_WRITE
    }

    /// Overwrites every preset-governed field with the values of `id`.
    ///
    /// Clears the custom flag. The ELF path, memory protection and memory timing
    /// are left untouched.
    pub fn apply_preset(&mut self, id: PresetId) {
        let preset = PresetCatalog::get(id);
        self.pipelined = preset.pipelined();
        self.delay_slot = preset.delay_slot();
        self.hazard_unit = preset.hazard_unit();
        self.cache_program = preset.cache(CacheUnit::Program).clone();
        self.cache_data = preset.cache(CacheUnit::Data).clone();
        self.is_custom = false;
        tracing::debug!(preset = %id, "applied machine preset");
    }

    /// The preset whose governed fields match this configuration, if any.
    pub fn preset(&self) -> Option<PresetId> {
        PresetCatalog::match_config(self)
    }

    /// Whether the configuration was edited after the last preset application.
    pub const fn is_custom(&self) -> bool {
        self.is_custom
    }

    pub(super) const fn set_custom_flag(&mut self, custom: bool) {
        self.is_custom = custom;
    }

    /// Path of the executable to load, if one was chosen.
    pub fn elf(&self) -> Option<&Path> {
        self.elf_path.as_deref()
    }

    /// Whether the core is pipelined.
    pub const fn pipelined(&self) -> bool {
        self.pipelined
    }

    /// Stored delay slot setting, regardless of pipelining.
    pub const fn delay_slot(&self) -> bool {
        self.delay_slot
    }

    /// Stored hazard unit, regardless of pipelining.
    pub const fn hazard_unit(&self) -> HazardUnit {
        self.hazard_unit
    }

    /// Delay slot setting a machine builder must use.
    ///
    /// Always `false` on a pipelined core.
    pub const fn effective_delay_slot(&self) -> bool {
        !self.pipelined && self.delay_slot
    }

    /// Hazard unit a machine builder must use.
    ///
    /// Always `HazardUnit::None` on a non-pipelined core.
    pub const fn effective_hazard_unit(&self) -> HazardUnit {
        if self.pipelined {
            self.hazard_unit
        } else {
            HazardUnit::None
        }
    }

    /// Whether executing from non-executable memory traps.
    pub const fn memory_execute_protection(&self) -> bool {
        self.memory_execute_protection
    }

    /// Whether writing to read-only memory traps.
    pub const fn memory_write_protection(&self) -> bool {
        self.memory_write_protection
    }

    /// Main memory read access time in cycles.
    pub const fn memory_access_time_read(&self) -> u32 {
        self.memory_access_time_read
    }

    /// Main memory write access time in cycles.
    pub const fn memory_access_time_write(&self) -> u32 {
        self.memory_access_time_write
    }

    /// Program (instruction) cache.
    pub const fn cache_program(&self) -> &CacheConfig {
        &self.cache_program
    }

    /// Data cache.
    pub const fn cache_data(&self) -> &CacheConfig {
        &self.cache_data
    }

    /// Cache configuration of `unit`.
    pub const fn cache(&self, unit: CacheUnit) -> &CacheConfig {
        match unit {
            CacheUnit::Program => &self.cache_program,
            CacheUnit::Data => &self.cache_data,
        }
    }

    /// Sets the executable path. An empty path clears it.
    ///
    /// The executable is not part of any preset, so the custom flag is left as is:
    /// choosing a program after applying a preset keeps that preset selected.
    pub fn set_elf(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.elf_path = (!path.as_os_str().is_empty()).then_some(path);
    }

    /// Enables or disables pipelining.
    pub const fn set_pipelined(&mut self, pipelined: bool) {
        self.pipelined = pipelined;
        self.is_custom = true;
    }

    /// Sets the raw delay slot value (ignored while pipelined).
    pub const fn set_delay_slot(&mut self, delay_slot: bool) {
        self.delay_slot = delay_slot;
        self.is_custom = true;
    }

    /// Sets the raw hazard unit (ignored while not pipelined).
    pub const fn set_hazard_unit(&mut self, hazard_unit: HazardUnit) {
        self.hazard_unit = hazard_unit;
        self.is_custom = true;
    }

    /// Enables or disables execute protection.
    pub const fn set_memory_execute_protection(&mut self, enabled: bool) {
        self.memory_execute_protection = enabled;
        self.is_custom = true;
    }

    /// Enables or disables write protection.
    pub const fn set_memory_write_protection(&mut self, enabled: bool) {
        self.memory_write_protection = enabled;
        self.is_custom = true;
    }

    /// Sets the read access time in cycles.
    pub const fn set_memory_access_time_read(&mut self, cycles: u32) {
        self.memory_access_time_read = cycles;
        self.is_custom = true;
    }

    /// Sets the write access time in cycles.
    pub const fn set_memory_access_time_write(&mut self, cycles: u32) {
        self.memory_access_time_write = cycles;
        self.is_custom = true;
    }

    /// Mutable access to the program cache.
    pub fn access_cache_program(&mut self) -> CacheAccess<'_> {
        self.access_cache(CacheUnit::Program)
    }

    /// Mutable access to the data cache.
    pub fn access_cache_data(&mut self) -> CacheAccess<'_> {
        self.access_cache(CacheUnit::Data)
    }

    /// Mutable access to the cache of `unit`.
    ///
    /// Every setter called through the returned guard marks this configuration custom.
    pub fn access_cache(&mut self, unit: CacheUnit) -> CacheAccess<'_> {
        let cache = match unit {
            CacheUnit::Program => &mut self.cache_program,
            CacheUnit::Data => &mut self.cache_data,
        };
        CacheAccess {
            unit,
            cache,
            custom: &mut self.is_custom,
        }
    }

    /// Checks that a machine can be built from this configuration.
    ///
    /// Checks run in a fixed order and the first failure is returned: ELF path,
    /// program cache, data cache, memory timing. Nothing is modified.
    ///
    /// # Errors
    ///
    /// `InvalidElfPath` when no readable regular file is configured,
    /// `InvalidCacheConfig` for an enabled cache with a zero geometry field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_elf()?;
        for unit in CacheUnit::ALL {
            self.cache(unit).validate(unit)?;
        }
        // Access times are unsigned cycle counts; every representable value is buildable.
        Ok(())
    }

    fn validate_elf(&self) -> Result<(), ConfigError> {
        let Some(path) = self.elf() else {
            return Err(ConfigError::InvalidElfPath {
                path: PathBuf::new(),
                reason: ElfPathProblem::Empty,
            });
        };
        let reject = |reason| ConfigError::InvalidElfPath {
            path: path.to_path_buf(),
            reason,
        };

        let metadata = fs::metadata(path).map_err(|err| {
            reject(match err.kind() {
                io::ErrorKind::NotFound => ElfPathProblem::Missing,
                _ => ElfPathProblem::Unreadable,
            })
        })?;
        if !metadata.is_file() {
            return Err(reject(ElfPathProblem::NotAFile));
        }
        let _ = File::open(path).map_err(|_| reject(ElfPathProblem::Unreadable))?;
        Ok(())
    }
}

impl Default for MachineConfig {
    /// Creates the configuration a fresh session starts from.
    ///
    /// Governed fields equal the `NoPipeline` preset; no executable is selected,
    /// memory protection is off and both access times are 10 cycles.
    fn default() -> Self {
        Self {
            elf_path: None,
            pipelined: defaults::PIPELINED,
            delay_slot: defaults::DELAY_SLOT,
            hazard_unit: defaults::HAZARD_UNIT,
            memory_execute_protection: defaults::EXEC_PROTECTION,
            memory_write_protection: defaults::WRITE_PROTECTION,
            memory_access_time_read: defaults::MEM_ACCESS_READ,
            memory_access_time_write: defaults::MEM_ACCESS_WRITE,
            cache_program: CacheConfig::default(),
            cache_data: CacheConfig::default(),
            is_custom: false,
        }
    }
}

/// Mutable view of one cache unit of a `MachineConfig`.
///
/// Reads go through `Deref` to the underlying `CacheConfig`. Writes go through the
/// setters below, which forward to the cache and report the returned `Mutation`
/// to the owning configuration's custom flag.
#[derive(Debug)]
pub struct CacheAccess<'a> {
    unit: CacheUnit,
    cache: &'a mut CacheConfig,
    custom: &'a mut bool,
}

impl CacheAccess<'_> {
    fn record(&mut self, mutation: Mutation) {
        *self.custom = true;
        if mutation.changed() {
            tracing::trace!(unit = %self.unit, "cache configuration changed");
        }
    }

    /// Unit this guard edits.
    pub const fn unit(&self) -> CacheUnit {
        self.unit
    }

    /// Enables or disables the cache.
    pub fn set_enabled(&mut self, enabled: bool) {
        let mutation = self.cache.set_enabled(enabled);
        self.record(mutation);
    }

    /// Sets the number of sets.
    pub fn set_sets(&mut self, sets: u32) {
        let mutation = self.cache.set_sets(sets);
        self.record(mutation);
    }

    /// Sets the block size.
    pub fn set_blocks(&mut self, blocks: u32) {
        let mutation = self.cache.set_blocks(blocks);
        self.record(mutation);
    }

    /// Sets the degree of associativity.
    pub fn set_associativity(&mut self, associativity: u32) {
        let mutation = self.cache.set_associativity(associativity);
        self.record(mutation);
    }

    /// Sets the replacement policy.
    pub fn set_replacement_policy(&mut self, policy: ReplacementPolicy) {
        let mutation = self.cache.set_replacement_policy(policy);
        self.record(mutation);
    }

    /// Sets the write policy.
    ///
    /// # Errors
    ///
    /// `NoWritePolicy` on the program cache, which is read-only. Neither the cache
    /// nor the custom flag is changed in that case.
    pub fn set_write_policy(&mut self, policy: WritePolicy) -> Result<(), ConfigError> {
        if !self.unit.has_write_policy() {
            return Err(ConfigError::NoWritePolicy { unit: self.unit });
        }
        let mutation = self.cache.set_write_policy(policy);
        self.record(mutation);
        Ok(())
    }
}

impl Deref for CacheAccess<'_> {
    type Target = CacheConfig;

    fn deref(&self) -> &CacheConfig {
        self.cache
    }
}
