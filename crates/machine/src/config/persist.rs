//! Persistence schema for `MachineConfig`.
//!
//! The configuration is stored as a flat set of keys (see [`keys`]). Presets and
//! free-standing fields are interleaved in storage, so loading is two-phase:
//! every present key is overlaid on a default configuration, then a named preset
//! (if any) is applied and the fields a preset never governs are overlaid again.
//!
//! `Preset` holds `0` for a custom configuration and the catalog index plus one
//! for a named preset. A store without a `Preset` key selects the first preset.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use super::cache::{CacheUnit, ReplacementPolicy, WritePolicy};
use super::machine::{HazardUnit, MachineConfig};
use super::preset::PresetId;
use crate::common::{ConfigError, MemoryTimingField};
use crate::store::{ConfigStore, StoreError, StoreValue};

/// Store keys used by the configuration schema.
pub mod keys {
    use super::CacheUnit;

    /// Selected preset: 0 = custom, 1..=4 = catalog index + 1.
    pub const PRESET: &str = "Preset";
    /// Executable path (string, may be empty).
    pub const ELF_PATH: &str = "ElfPath";
    /// Pipelined core (bool).
    pub const PIPELINED: &str = "Pipelined";
    /// Raw delay slot setting (bool).
    pub const DELAY_SLOT: &str = "DelaySlot";
    /// Hazard unit code: 0 = none, 1 = stall, 2 = stall and forward.
    pub const HAZARD_UNIT: &str = "HazardUnit";
    /// Execute protection (bool).
    pub const MEMORY_EXECUTE_PROTECTION: &str = "MemoryExecuteProtection";
    /// Write protection (bool).
    pub const MEMORY_WRITE_PROTECTION: &str = "MemoryWriteProtection";
    /// Read access time in cycles (uint).
    pub const MEMORY_ACCESS_TIME_READ: &str = "MemoryAccessTimeRead";
    /// Write access time in cycles (uint).
    pub const MEMORY_ACCESS_TIME_WRITE: &str = "MemoryAccessTimeWrite";

    /// Field of a cache unit, keyed under `Cache.<Unit>.<Field>`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum CacheKey {
        /// `Enabled` (bool).
        Enabled,
        /// `Sets` (uint).
        Sets,
        /// `Blocks` (uint).
        Blocks,
        /// `Associativity` (uint).
        Associativity,
        /// `ReplacementPolicy` code (uint).
        ReplacementPolicy,
        /// `WritePolicy` code (uint); data cache only.
        WritePolicy,
    }

    impl CacheKey {
        /// Every cache key, in storage order.
        pub const ALL: [Self; 6] = [
            Self::Enabled,
            Self::Sets,
            Self::Blocks,
            Self::Associativity,
            Self::ReplacementPolicy,
            Self::WritePolicy,
        ];

        const fn name(self) -> &'static str {
            match self {
                Self::Enabled => "Enabled",
                Self::Sets => "Sets",
                Self::Blocks => "Blocks",
                Self::Associativity => "Associativity",
                Self::ReplacementPolicy => "ReplacementPolicy",
                Self::WritePolicy => "WritePolicy",
            }
        }
    }

    /// Full key of `field` for the cache `unit`, e.g. `Cache.Data.Sets`.
    pub fn cache(unit: CacheUnit, field: CacheKey) -> String {
        let unit = match unit {
            CacheUnit::Program => "Program",
            CacheUnit::Data => "Data",
        };
        format!("Cache.{unit}.{}", field.name())
    }
}

use keys::CacheKey;

fn read<S>(store: &S, key: &str) -> Result<Option<StoreValue>, ConfigError>
where
    S: ConfigStore + ?Sized,
{
    store.get(key).map_err(|source| read_error(key, source))
}

fn read_error(key: &str, source: StoreError) -> ConfigError {
    ConfigError::StoreRead {
        key: key.to_owned(),
        source,
    }
}

fn invalid_value(key: &str, value: u64) -> ConfigError {
    read_error(
        key,
        StoreError::InvalidValue {
            key: key.to_owned(),
            value,
        },
    )
}

fn read_bool<S: ConfigStore + ?Sized>(store: &S, key: &str) -> Result<Option<bool>, ConfigError> {
    read(store, key)?
        .map(|value| value.require_bool(key))
        .transpose()
        .map_err(|source| read_error(key, source))
}

fn read_uint<S: ConfigStore + ?Sized>(store: &S, key: &str) -> Result<Option<u64>, ConfigError> {
    read(store, key)?
        .map(|value| value.require_uint(key))
        .transpose()
        .map_err(|source| read_error(key, source))
}

fn read_str<S: ConfigStore + ?Sized>(store: &S, key: &str) -> Result<Option<String>, ConfigError> {
    read(store, key)?
        .map(|value| value.require_str(key).map(str::to_owned))
        .transpose()
        .map_err(|source| read_error(key, source))
}

/// Reads an integer key and decodes it with `decode`, rejecting unknown codes.
fn read_code<S, T>(
    store: &S,
    key: &str,
    decode: fn(u64) -> Option<T>,
) -> Result<Option<T>, ConfigError>
where
    S: ConfigStore + ?Sized,
{
    read_uint(store, key)?
        .map(|code| decode(code).ok_or_else(|| invalid_value(key, code)))
        .transpose()
}

fn read_cycles<S: ConfigStore + ?Sized>(
    store: &S,
    field: MemoryTimingField,
) -> Result<Option<u32>, ConfigError> {
    let key = match field {
        MemoryTimingField::Read => keys::MEMORY_ACCESS_TIME_READ,
        MemoryTimingField::Write => keys::MEMORY_ACCESS_TIME_WRITE,
    };
    let out_of_range = |_| ConfigError::InvalidMemoryTiming { field };
    read_uint(store, key)?
        .map(|cycles| u32::try_from(cycles).map_err(out_of_range))
        .transpose()
}

/// Reads a cache geometry field, rejecting values that do not fit the model.
fn read_geometry<S>(store: &S, key: &str) -> Result<Option<u32>, ConfigError>
where
    S: ConfigStore + ?Sized,
{
    read_uint(store, key)?
        .map(|value| u32::try_from(value).map_err(|_| invalid_value(key, value)))
        .transpose()
}

/// Decodes the `Preset` key. `None` means custom.
fn read_preset<S: ConfigStore + ?Sized>(store: &S) -> Result<Option<PresetId>, ConfigError> {
    match read_uint(store, keys::PRESET)? {
        None => Ok(Some(PresetId::NoPipeline)),
        Some(0) => Ok(None),
        Some(n) => usize::try_from(n - 1)
            .ok()
            .and_then(PresetId::from_index)
            .map(Some)
            .ok_or(ConfigError::UnknownPresetId(n)),
    }
}

fn write<S>(store: &mut S, key: &str, value: StoreValue) -> Result<(), ConfigError>
where
    S: ConfigStore + ?Sized,
{
    store
        .set(key, value)
        .map_err(|source| ConfigError::StoreWrite {
            key: key.to_owned(),
            source,
        })
}

/// String stored under `ElfPath`; empty when no executable is selected.
fn elf_value(path: Option<&Path>) -> String {
    let Some(path) = path else {
        return String::new();
    };
    let text = path.to_string_lossy();
    if matches!(text, Cow::Owned(_)) {
        tracing::warn!(
            path = %path.display(),
            "executable path is not valid UTF-8; storing a lossy copy"
        );
    }
    text.into_owned()
}

impl MachineConfig {
    /// Loads a configuration, falling back to defaults when the store is unusable.
    ///
    /// A missing key keeps its default. Any read failure, type mismatch or unknown
    /// code discards the whole snapshot: a corrupt store never blocks a session.
    pub fn load<S: ConfigStore + ?Sized>(store: &S) -> Self {
        Self::try_load(store).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "configuration store unusable, using defaults");
            Self::default()
        })
    }

    /// Loads a configuration, reporting the first problem found in the store.
    ///
    /// # Errors
    ///
    /// `StoreRead` for backend failures, type mismatches and unknown enum codes,
    /// `InvalidMemoryTiming` for access times that do not fit, and
    /// `UnknownPresetId` for a `Preset` value outside the catalog.
    pub fn try_load<S: ConfigStore + ?Sized>(store: &S) -> Result<Self, ConfigError> {
        let preset = read_preset(store)?;
        let mut config = Self::default();

        config.overlay_core(store)?;
        config.overlay_ungoverned(store)?;
        for unit in CacheUnit::ALL {
            config.overlay_cache(store, unit)?;
        }

        if let Some(id) = preset {
            config.apply_preset(id);
            config.overlay_ungoverned(store)?;
        }
        config.set_custom_flag(preset.is_none());

        tracing::debug!(preset = ?preset, "loaded machine configuration");
        Ok(config)
    }

    /// Value `store` writes under the `Preset` key.
    ///
    /// `0` when custom or when no preset matches, otherwise the matched preset.
    pub fn persisted_preset_index(&self) -> u64 {
        if self.is_custom() {
            return 0;
        }
        self.preset().map_or(0, PresetId::persisted)
    }

    /// Writes every schema key to `store`.
    ///
    /// The store is not flushed. A failure stops at the failing key; keys written
    /// before it stay written and the configuration itself is unchanged.
    ///
    /// The executable path is stored as a string. A path that is not valid UTF-8
    /// is stored lossily and a warning is logged.
    ///
    /// # Errors
    ///
    /// `StoreWrite` naming the first key the store rejected.
    pub fn store<S: ConfigStore + ?Sized>(&self, store: &mut S) -> Result<(), ConfigError> {
        let preset = self.persisted_preset_index();
        let entries: [(&str, StoreValue); 9] = [
            (keys::PRESET, preset.into()),
            (keys::ELF_PATH, elf_value(self.elf()).into()),
            (keys::PIPELINED, self.pipelined().into()),
            (keys::DELAY_SLOT, self.delay_slot().into()),
            (keys::HAZARD_UNIT, self.hazard_unit().code().into()),
            (
                keys::MEMORY_EXECUTE_PROTECTION,
                self.memory_execute_protection().into(),
            ),
            (
                keys::MEMORY_WRITE_PROTECTION,
                self.memory_write_protection().into(),
            ),
            (
                keys::MEMORY_ACCESS_TIME_READ,
                self.memory_access_time_read().into(),
            ),
            (
                keys::MEMORY_ACCESS_TIME_WRITE,
                self.memory_access_time_write().into(),
            ),
        ];
        for (key, value) in entries {
            write(store, key, value)?;
        }

        for unit in CacheUnit::ALL {
            let cache = self.cache(unit);
            for field in CacheKey::ALL {
                let value = match field {
                    CacheKey::Enabled => cache.enabled().into(),
                    CacheKey::Sets => cache.sets().into(),
                    CacheKey::Blocks => cache.blocks().into(),
                    CacheKey::Associativity => cache.associativity().into(),
                    CacheKey::ReplacementPolicy => cache.replacement_policy().code().into(),
                    CacheKey::WritePolicy if unit.has_write_policy() => {
                        cache.write_policy().code().into()
                    }
                    CacheKey::WritePolicy => continue,
                };
                write(store, &keys::cache(unit, field), value)?;
            }
        }

        tracing::debug!(preset, "stored machine configuration");
        Ok(())
    }

    /// Overlays pipelining, delay slot and hazard unit.
    fn overlay_core<S: ConfigStore + ?Sized>(&mut self, store: &S) -> Result<(), ConfigError> {
        if let Some(pipelined) = read_bool(store, keys::PIPELINED)? {
            self.set_pipelined(pipelined);
        }
        if let Some(delay_slot) = read_bool(store, keys::DELAY_SLOT)? {
            self.set_delay_slot(delay_slot);
        }
        if let Some(hazard_unit) = read_code(store, keys::HAZARD_UNIT, HazardUnit::from_code)? {
            self.set_hazard_unit(hazard_unit);
        }
        Ok(())
    }

    /// Overlays the fields no preset governs: ELF path, protection and timing.
    fn overlay_ungoverned<S>(&mut self, store: &S) -> Result<(), ConfigError>
    where
        S: ConfigStore + ?Sized,
    {
        if let Some(path) = read_str(store, keys::ELF_PATH)? {
            self.set_elf(PathBuf::from(path));
        }
        if let Some(enabled) = read_bool(store, keys::MEMORY_EXECUTE_PROTECTION)? {
            self.set_memory_execute_protection(enabled);
        }
        if let Some(enabled) = read_bool(store, keys::MEMORY_WRITE_PROTECTION)? {
            self.set_memory_write_protection(enabled);
        }
        if let Some(cycles) = read_cycles(store, MemoryTimingField::Read)? {
            self.set_memory_access_time_read(cycles);
        }
        if let Some(cycles) = read_cycles(store, MemoryTimingField::Write)? {
            self.set_memory_access_time_write(cycles);
        }
        Ok(())
    }

    fn overlay_cache<S>(&mut self, store: &S, unit: CacheUnit) -> Result<(), ConfigError>
    where
        S: ConfigStore + ?Sized,
    {
        let key = |field| keys::cache(unit, field);
        let mut cache = self.access_cache(unit);

        if let Some(enabled) = read_bool(store, &key(CacheKey::Enabled))? {
            cache.set_enabled(enabled);
        }
        if let Some(sets) = read_geometry(store, &key(CacheKey::Sets))? {
            cache.set_sets(sets);
        }
        if let Some(blocks) = read_geometry(store, &key(CacheKey::Blocks))? {
            cache.set_blocks(blocks);
        }
        if let Some(associativity) = read_geometry(store, &key(CacheKey::Associativity))? {
            cache.set_associativity(associativity);
        }
        let replacement = key(CacheKey::ReplacementPolicy);
        if let Some(policy) = read_code(store, &replacement, ReplacementPolicy::from_code)? {
            cache.set_replacement_policy(policy);
        }
        if unit.has_write_policy() {
            let write_policy = key(CacheKey::WritePolicy);
            if let Some(policy) = read_code(store, &write_policy, WritePolicy::from_code)? {
                cache.set_write_policy(policy)?;
            }
        }
        Ok(())
    }
}
