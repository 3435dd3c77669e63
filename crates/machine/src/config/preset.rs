//! Machine presets.
//!
//! A preset is a named assignment of the fields that define the core and its caches:
//! pipelining, delay slot, hazard unit, program cache and data cache. The ELF path,
//! memory protection and memory timing are never governed by a preset.
//!
//! The catalog is a fixed, ordered table. Its order is part of the persistence
//! schema (`Preset` stores the catalog index plus one).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::cache::{CacheConfig, CacheUnit};
use super::defaults;
use super::machine::{HazardUnit, MachineConfig};

/// Identifier of a catalog preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PresetId {
    /// Single-cycle core without caches.
    NoPipeline,
    /// Five-stage pipeline without a hazard unit and without caches.
    PipelinedNoHazard,
    /// Pipeline with stall and forwarding, without caches.
    PipelinedWithHazardNoCache,
    /// Pipeline with stall and forwarding and both caches enabled.
    PipelinedWithHazardAndCache,
}

impl PresetId {
    /// All presets in catalog order.
    pub const ALL: [Self; 4] = [
        Self::NoPipeline,
        Self::PipelinedNoHazard,
        Self::PipelinedWithHazardNoCache,
        Self::PipelinedWithHazardAndCache,
    ];

    /// Position in the catalog.
    pub const fn index(self) -> usize {
        match self {
            Self::NoPipeline => 0,
            Self::PipelinedNoHazard => 1,
            Self::PipelinedWithHazardNoCache => 2,
            Self::PipelinedWithHazardAndCache => 3,
        }
    }

    /// Looks a preset up by catalog position.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::NoPipeline),
            1 => Some(Self::PipelinedNoHazard),
            2 => Some(Self::PipelinedWithHazardNoCache),
            3 => Some(Self::PipelinedWithHazardAndCache),
            _ => None,
        }
    }

    /// Value stored under the `Preset` key for this preset (index plus one).
    pub const fn persisted(self) -> u64 {
        self.index() as u64 + 1
    }

    /// Short machine-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoPipeline => "no-pipeline",
            Self::PipelinedNoHazard => "pipelined-no-hazard",
            Self::PipelinedWithHazardNoCache => "pipelined-hazard-no-cache",
            Self::PipelinedWithHazardAndCache => "pipelined-hazard-cache",
        }
    }

    /// Human-readable label for choice controls.
    pub const fn label(self) -> &'static str {
        match self {
            Self::NoPipeline => "No pipeline, no cache",
            Self::PipelinedNoHazard => "Pipelined without hazard unit and without cache",
            Self::PipelinedWithHazardNoCache => "Pipelined with hazard unit and without cache",
            Self::PipelinedWithHazardAndCache => "Pipelined with hazard unit and cache",
        }
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown preset name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown preset `{0}`")]
pub struct UnknownPresetName(pub String);

impl FromStr for PresetId {
    type Err = UnknownPresetName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.name() == s)
            .ok_or_else(|| UnknownPresetName(s.to_owned()))
    }
}

/// Ordered preset identifiers, for populating choice controls.
pub const fn preset_ids() -> [PresetId; 4] {
    PresetId::ALL
}

/// Immutable field assignment of one preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    id: PresetId,
    pipelined: bool,
    delay_slot: bool,
    hazard_unit: HazardUnit,
    cache_program: CacheConfig,
    cache_data: CacheConfig,
}

/// Cache geometry shared by both units in the cached preset.
const PRESET_CACHE: CacheConfig = CacheConfig::with_geometry(
    defaults::PRESET_CACHE_SETS,
    defaults::PRESET_CACHE_BLOCKS,
    defaults::PRESET_CACHE_ASSOCIATIVITY,
);

static PRESETS: [Preset; 4] = [
    Preset {
        id: PresetId::NoPipeline,
        pipelined: false,
        delay_slot: true,
        hazard_unit: HazardUnit::StallAndForward,
        cache_program: CacheConfig::DISABLED,
        cache_data: CacheConfig::DISABLED,
    },
    Preset {
        id: PresetId::PipelinedNoHazard,
        pipelined: true,
        delay_slot: true,
        hazard_unit: HazardUnit::None,
        cache_program: CacheConfig::DISABLED,
        cache_data: CacheConfig::DISABLED,
    },
    Preset {
        id: PresetId::PipelinedWithHazardNoCache,
        pipelined: true,
        delay_slot: true,
        hazard_unit: HazardUnit::StallAndForward,
        cache_program: CacheConfig::DISABLED,
        cache_data: CacheConfig::DISABLED,
    },
    Preset {
        id: PresetId::PipelinedWithHazardAndCache,
        pipelined: true,
        delay_slot: true,
        hazard_unit: HazardUnit::StallAndForward,
        cache_program: PRESET_CACHE,
        cache_data: PRESET_CACHE,
    },
];

impl Preset {
    /// Identifier of this preset.
    pub const fn id(&self) -> PresetId {
        self.id
    }

    /// Whether the preset machine is pipelined.
    pub const fn pipelined(&self) -> bool {
        self.pipelined
    }

    /// Raw delay slot setting.
    pub const fn delay_slot(&self) -> bool {
        self.delay_slot
    }

    /// Raw hazard unit setting.
    pub const fn hazard_unit(&self) -> HazardUnit {
        self.hazard_unit
    }

    /// Cache assignment for `unit`.
    pub const fn cache(&self, unit: CacheUnit) -> &CacheConfig {
        match unit {
            CacheUnit::Program => &self.cache_program,
            CacheUnit::Data => &self.cache_data,
        }
    }

    /// Whether `config` carries exactly this preset's governed fields.
    pub fn matches(&self, config: &MachineConfig) -> bool {
        config.pipelined() == self.pipelined
            && config.delay_slot() == self.delay_slot
            && config.hazard_unit() == self.hazard_unit
            && CacheUnit::ALL
                .into_iter()
                .all(|unit| config.cache(unit).same_as(self.cache(unit), unit))
    }
}

/// The fixed table of machine presets.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresetCatalog;

impl PresetCatalog {
    /// Returns the preset record for `id`.
    pub fn get(id: PresetId) -> &'static Preset {
        &PRESETS[id.index()]
    }

    /// Iterates the catalog in order.
    pub fn iter() -> impl Iterator<Item = &'static Preset> {
        PRESETS.iter()
    }

    /// Builds a default configuration with `id` applied.
    pub fn apply(id: PresetId) -> MachineConfig {
        let mut config = MachineConfig::default();
        config.apply_preset(id);
        config
    }

    /// Reverse lookup: the preset whose governed fields equal the configuration's.
    ///
    /// ELF path, memory protection and memory timing are ignored, as is the
    /// program cache write policy.
    pub fn match_config(config: &MachineConfig) -> Option<PresetId> {
        Self::iter()
            .find(|preset| preset.matches(config))
            .map(Preset::id)
    }
}
