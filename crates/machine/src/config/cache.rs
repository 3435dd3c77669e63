//! Cache unit configuration.
//!
//! A `CacheConfig` is a plain value describing one cache unit. It has no link back to
//! the machine that owns it: every setter returns a `Mutation` marker and the owner
//! decides what the change means for its own state (see `CacheAccess`).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::common::ConfigError;

/// Cache replacement policy algorithms.
///
/// Selects which line of a full set is evicted when a new block is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ReplacementPolicy {
    /// Evicts a randomly selected line of the set.
    #[default]
    Random,
    /// Least Recently Used.
    #[serde(alias = "LRU")]
    Lru,
    /// Least Frequently Used.
    #[serde(alias = "LFU")]
    Lfu,
}

impl ReplacementPolicy {
    /// All policies in persistence order.
    pub const ALL: [Self; 3] = [Self::Random, Self::Lru, Self::Lfu];

    /// Integer code used by the persistence schema.
    pub const fn code(self) -> u64 {
        match self {
            Self::Random => 0,
            Self::Lru => 1,
            Self::Lfu => 2,
        }
    }

    /// Decodes a persisted code.
    pub const fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Random),
            1 => Some(Self::Lru),
            2 => Some(Self::Lfu),
            _ => None,
        }
    }
}

impl fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => f.write_str("random"),
            Self::Lru => f.write_str("lru"),
            Self::Lfu => f.write_str("lfu"),
        }
    }
}

/// Data cache write policies.
///
/// Only meaningful for the data cache; instruction caches are read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum WritePolicy {
    /// Write-through; a write miss does not allocate a line.
    #[default]
    WriteThroughNoAllocate,
    /// Write-through; a write miss allocates a line.
    WriteThroughAllocate,
    /// Write-back with dirty lines flushed on eviction.
    WriteBack,
}

impl WritePolicy {
    /// All policies in persistence order.
    pub const ALL: [Self; 3] = [
        Self::WriteThroughNoAllocate,
        Self::WriteThroughAllocate,
        Self::WriteBack,
    ];

    /// Integer code used by the persistence schema.
    pub const fn code(self) -> u64 {
        match self {
            Self::WriteThroughNoAllocate => 0,
            Self::WriteThroughAllocate => 1,
            Self::WriteBack => 2,
        }
    }

    /// Decodes a persisted code.
    pub const fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::WriteThroughNoAllocate),
            1 => Some(Self::WriteThroughAllocate),
            2 => Some(Self::WriteBack),
            _ => None,
        }
    }
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteThroughNoAllocate => f.write_str("write-through (no allocate)"),
            Self::WriteThroughAllocate => f.write_str("write-through (allocate)"),
            Self::WriteBack => f.write_str("write-back"),
        }
    }
}

/// The two cache units of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheUnit {
    /// Instruction (program) cache.
    Program,
    /// Data cache.
    Data,
}

impl CacheUnit {
    /// Both units in validation order.
    pub const ALL: [Self; 2] = [Self::Program, Self::Data];

    /// Whether this unit has a configurable write policy.
    pub const fn has_write_policy(self) -> bool {
        matches!(self, Self::Data)
    }
}

impl fmt::Display for CacheUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Program => f.write_str("program"),
            Self::Data => f.write_str("data"),
        }
    }
}

/// Cache geometry field named by an `InvalidCacheConfig` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheField {
    /// Number of sets.
    Sets,
    /// Block size.
    Blocks,
    /// Degree of associativity.
    Associativity,
}

impl fmt::Display for CacheField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sets => f.write_str("number of sets"),
            Self::Blocks => f.write_str("block size"),
            Self::Associativity => f.write_str("degree of associativity"),
        }
    }
}

/// Marker returned by every `CacheConfig` setter.
///
/// The owner of the cache folds it into its own bookkeeping; the cache itself never
/// learns who owns it.
#[must_use = "cache mutations must be reported to the owning configuration"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mutation {
    changed: bool,
}

impl Mutation {
    const fn new(changed: bool) -> Self {
        Self { changed }
    }

    /// Whether the stored value actually differs from the previous one.
    pub const fn changed(self) -> bool {
        self.changed
    }
}

/// Individual cache unit configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    enabled: bool,

    #[serde(default = "CacheConfig::default_sets")]
    sets: u32,

    #[serde(default = "CacheConfig::default_blocks")]
    blocks: u32,

    #[serde(default = "CacheConfig::default_associativity")]
    associativity: u32,

    #[serde(default)]
    replacement_policy: ReplacementPolicy,

    #[serde(default)]
    write_policy: WritePolicy,
}

impl CacheConfig {
    /// A disabled cache with default geometry and policies.
    pub const DISABLED: Self = Self {
        enabled: false,
        sets: defaults::CACHE_SETS,
        blocks: defaults::CACHE_BLOCKS,
        associativity: defaults::CACHE_ASSOCIATIVITY,
        replacement_policy: ReplacementPolicy::Random,
        write_policy: WritePolicy::WriteThroughNoAllocate,
    };

    /// Returns the default number of sets.
    const fn default_sets() -> u32 {
        defaults::CACHE_SETS
    }

    /// Returns the default block size.
    const fn default_blocks() -> u32 {
        defaults::CACHE_BLOCKS
    }

    /// Returns the default associativity.
    const fn default_associativity() -> u32 {
        defaults::CACHE_ASSOCIATIVITY
    }

    /// Creates an enabled cache with the given geometry and default policies.
    pub const fn with_geometry(sets: u32, blocks: u32, associativity: u32) -> Self {
        Self {
            enabled: true,
            sets,
            blocks,
            associativity,
            replacement_policy: ReplacementPolicy::Random,
            write_policy: WritePolicy::WriteThroughNoAllocate,
        }
    }

    /// Returns a copy using the given replacement policy.
    pub const fn with_replacement_policy(mut self, policy: ReplacementPolicy) -> Self {
        self.replacement_policy = policy;
        self
    }

    /// Returns a copy using the given write policy.
    pub const fn with_write_policy(mut self, policy: WritePolicy) -> Self {
        self.write_policy = policy;
        self
    }

    /// Whether the cache is part of the machine.
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Number of sets.
    pub const fn sets(&self) -> u32 {
        self.sets
    }

    /// Block size in words.
    pub const fn blocks(&self) -> u32 {
        self.blocks
    }

    /// Degree of associativity (ways per set).
    pub const fn associativity(&self) -> u32 {
        self.associativity
    }

    /// Replacement policy.
    pub const fn replacement_policy(&self) -> ReplacementPolicy {
        self.replacement_policy
    }

    /// Write policy. Has no meaning for the program cache.
    pub const fn write_policy(&self) -> WritePolicy {
        self.write_policy
    }

    /// Total capacity in words, saturating on overflow.
    pub const fn capacity_words(&self) -> u64 {
        (self.sets as u64)
            .saturating_mul(self.blocks as u64)
            .saturating_mul(self.associativity as u64)
    }

    /// Enables or disables the cache. Other fields are kept either way.
    pub fn set_enabled(&mut self, enabled: bool) -> Mutation {
        Mutation::new(std::mem::replace(&mut self.enabled, enabled) != enabled)
    }

    /// Sets the number of sets.
    pub fn set_sets(&mut self, sets: u32) -> Mutation {
        Mutation::new(std::mem::replace(&mut self.sets, sets) != sets)
    }

    /// Sets the block size.
    pub fn set_blocks(&mut self, blocks: u32) -> Mutation {
        Mutation::new(std::mem::replace(&mut self.blocks, blocks) != blocks)
    }

    /// Sets the degree of associativity.
    pub fn set_associativity(&mut self, associativity: u32) -> Mutation {
        Mutation::new(std::mem::replace(&mut self.associativity, associativity) != associativity)
    }

    /// Sets the replacement policy.
    pub fn set_replacement_policy(&mut self, policy: ReplacementPolicy) -> Mutation {
        Mutation::new(std::mem::replace(&mut self.replacement_policy, policy) != policy)
    }

    /// Sets the write policy.
    pub fn set_write_policy(&mut self, policy: WritePolicy) -> Mutation {
        Mutation::new(std::mem::replace(&mut self.write_policy, policy) != policy)
    }

    /// Returns the first geometry field that makes an enabled cache unbuildable.
    ///
    /// Disabled caches are never invalid. Fields are checked in the order sets,
    /// blocks, associativity.
    pub const fn invalid_field(&self) -> Option<CacheField> {
        if !self.enabled {
            return None;
        }
        if self.sets == 0 {
            Some(CacheField::Sets)
        } else if self.blocks == 0 {
            Some(CacheField::Blocks)
        } else if self.associativity == 0 {
            Some(CacheField::Associativity)
        } else {
            None
        }
    }

    /// Validates this cache as the given unit.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidCacheConfig` naming `unit` and the first zero field.
    pub fn validate(&self, unit: CacheUnit) -> Result<(), ConfigError> {
        match self.invalid_field() {
            Some(field) => Err(ConfigError::InvalidCacheConfig { unit, field }),
            None => Ok(()),
        }
    }

    /// Compares the fields that matter for `unit`.
    ///
    /// The program cache ignores its write policy.
    pub fn same_as(&self, other: &Self, unit: CacheUnit) -> bool {
        self.enabled == other.enabled
            && self.sets == other.sets
            && self.blocks == other.blocks
            && self.associativity == other.associativity
            && self.replacement_policy == other.replacement_policy
            && (!unit.has_write_policy() || self.write_policy == other.write_policy)
    }
}

impl Default for CacheConfig {
    /// Creates a default cache configuration.
    ///
    /// The cache is disabled, direct-mapped, one set of one word, with random
    /// replacement and write-through without allocation.
    fn default() -> Self {
        Self::DISABLED
    }
}
