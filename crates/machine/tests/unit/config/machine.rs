//! # Machine Configuration Tests
//!
//! Tests for defaults, effective fields, the custom flag and the cache
//! access guard.

use mipsim_machine::{ConfigError, MachineConfig};
use mipsim_machine::config::{CacheUnit, HazardUnit, PresetId, ReplacementPolicy, WritePolicy};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

#[test]
fn test_machine_config_defaults() {
    let config = MachineConfig::default();
    assert_eq!(config.elf(), None);
    assert!(!config.pipelined());
    assert!(config.delay_slot());
    assert_eq!(config.hazard_unit(), HazardUnit::StallAndForward);
    assert!(!config.memory_execute_protection());
    assert!(!config.memory_write_protection());
    assert_eq!(config.memory_access_time_read(), 10);
    assert_eq!(config.memory_access_time_write(), 10);
    assert!(!config.cache_program().enabled());
    assert!(!config.cache_data().enabled());
    assert!(!config.is_custom());
    assert_eq!(config.preset(), Some(PresetId::NoPipeline));
}

#[test]
fn test_pipelined_disables_delay_slot() {
    let mut config = MachineConfig::default();
    config.set_delay_slot(true);
    config.set_pipelined(true);
    assert!(config.delay_slot());
    assert!(!config.effective_delay_slot());

    config.set_pipelined(false);
    assert!(config.effective_delay_slot());
}

#[test]
fn test_unpipelined_has_no_hazard_unit() {
    let mut config = MachineConfig::default();
    config.set_hazard_unit(HazardUnit::Stall);
    assert_eq!(config.effective_hazard_unit(), HazardUnit::None);

    config.set_pipelined(true);
    assert_eq!(config.effective_hazard_unit(), HazardUnit::Stall);
}

proptest! {
    #[test]
    fn test_effective_fields_follow_pipelining(
        pipelined in any::<bool>(),
        delay_slot in any::<bool>(),
        hazard in prop::sample::select(HazardUnit::ALL.to_vec()),
    ) {
        let mut config = MachineConfig::default();
        config.set_pipelined(pipelined);
        config.set_delay_slot(delay_slot);
        config.set_hazard_unit(hazard);

        prop_assert_eq!(config.effective_delay_slot(), !pipelined && delay_slot);
        let expected = if pipelined { hazard } else { HazardUnit::None };
        prop_assert_eq!(config.effective_hazard_unit(), expected);
        prop_assert_eq!(config.delay_slot(), delay_slot);
        prop_assert_eq!(config.hazard_unit(), hazard);
    }
}

fn mutate(config: &mut MachineConfig, mutator: usize) {
    match mutator {
        0 => config.set_pipelined(true),
        1 => config.set_delay_slot(false),
        2 => config.set_hazard_unit(HazardUnit::Stall),
        3 => config.set_memory_execute_protection(true),
        4 => config.set_memory_write_protection(true),
        5 => config.set_memory_access_time_read(1),
        6 => config.set_memory_access_time_write(1),
        7 => config.access_cache_program().set_enabled(true),
        8 => config.access_cache_program().set_sets(2),
        9 => config.access_cache_program().set_blocks(2),
        10 => config.access_cache_program().set_associativity(2),
        11 => config.access_cache_program().set_replacement_policy(ReplacementPolicy::Lru),
        12 => config.access_cache_data().set_enabled(true),
        13 => config.access_cache_data().set_sets(2),
        14 => config.access_cache_data().set_blocks(2),
        15 => config.access_cache_data().set_associativity(2),
        16 => config.access_cache_data().set_replacement_policy(ReplacementPolicy::Lfu),
        17 => config
            .access_cache_data()
            .set_write_policy(WritePolicy::WriteBack)
            .unwrap(),
        _ => unreachable!("unknown mutator {mutator}"),
    }
}

#[rstest]
fn test_any_mutator_marks_custom(
    #[values(
        PresetId::NoPipeline,
        PresetId::PipelinedNoHazard,
        PresetId::PipelinedWithHazardNoCache,
        PresetId::PipelinedWithHazardAndCache
    )]
    id: PresetId,
    #[values(0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17)] mutator: usize,
) {
    let mut config = MachineConfig::default();
    config.apply_preset(id);
    assert!(!config.is_custom());

    mutate(&mut config, mutator);
    assert!(config.is_custom());
}

#[test]
fn test_setting_same_value_still_marks_custom() {
    let mut config = MachineConfig::default();
    config.apply_preset(PresetId::NoPipeline);
    config.set_pipelined(false);
    assert!(config.is_custom());
    assert_eq!(config.preset(), Some(PresetId::NoPipeline));
}

#[rstest]
fn test_choosing_executable_keeps_preset(
    #[values(
        PresetId::NoPipeline,
        PresetId::PipelinedNoHazard,
        PresetId::PipelinedWithHazardNoCache,
        PresetId::PipelinedWithHazardAndCache
    )]
    id: PresetId,
) {
    let mut config = MachineConfig::default();
    config.apply_preset(id);
    config.set_elf("program.elf");
    assert!(!config.is_custom());
    assert_eq!(config.preset(), Some(id));
    assert_eq!(config.persisted_preset_index(), id.persisted());
}

#[test]
fn test_program_write_policy_is_rejected() {
    let mut config = MachineConfig::default();
    config.apply_preset(PresetId::PipelinedWithHazardAndCache);

    match config.access_cache_program().set_write_policy(WritePolicy::WriteBack) {
        Err(ConfigError::NoWritePolicy { unit }) => assert_eq!(unit, CacheUnit::Program),
        other => panic!("expected NoWritePolicy, got {other:?}"),
    }
    assert!(!config.is_custom());
    assert_eq!(
        config.cache_program().write_policy(),
        WritePolicy::WriteThroughNoAllocate
    );
}

#[test]
fn test_cache_guard_reads_through() {
    let mut config = MachineConfig::default();
    config.apply_preset(PresetId::PipelinedWithHazardAndCache);
    let cache = config.access_cache(CacheUnit::Data);
    assert_eq!(cache.unit(), CacheUnit::Data);
    assert!(cache.enabled());
    assert_eq!(cache.sets(), 4);
}

#[test]
fn test_empty_elf_path_clears_it() {
    let mut config = MachineConfig::default();
    config.set_elf("program.elf");
    assert!(config.elf().is_some());
    config.set_elf("");
    assert_eq!(config.elf(), None);
}

#[test]
fn test_apply_preset_keeps_ungoverned_fields() {
    let mut config = MachineConfig::default();
    config.set_elf("program.elf");
    config.set_memory_execute_protection(true);
    config.set_memory_access_time_write(42);

    config.apply_preset(PresetId::PipelinedNoHazard);
    assert!(!config.is_custom());
    assert_eq!(config.elf().and_then(|p| p.to_str()), Some("program.elf"));
    assert!(config.memory_execute_protection());
    assert_eq!(config.memory_access_time_write(), 42);
    assert!(config.pipelined());
    assert_eq!(config.hazard_unit(), HazardUnit::None);
}

#[test]
fn test_hazard_unit_codes() {
    for (code, unit) in (0u64..).zip(HazardUnit::ALL) {
        assert_eq!(unit.code(), code);
        assert_eq!(HazardUnit::from_code(code), Some(unit));
    }
    assert_eq!(HazardUnit::from_code(3), None);
}

#[test]
fn test_config_serializes_without_custom_flag() {
    let mut config = MachineConfig::default();
    config.set_pipelined(true);
    let json = serde_json::to_value(&config).unwrap();
    assert!(json.get("is_custom").is_none());
    assert_eq!(json["pipelined"], serde_json::Value::Bool(true));

    let back: MachineConfig = serde_json::from_value(json).unwrap();
    assert!(back.pipelined());
    assert!(!back.is_custom());
}

#[test]
fn test_partial_json_uses_defaults() {
    let config: MachineConfig = serde_json::from_str(r#"{ "pipelined": true }"#).unwrap();
    assert!(config.pipelined());
    assert!(config.delay_slot());
    assert_eq!(config.hazard_unit(), HazardUnit::StallAndForward);
    assert_eq!(config.memory_access_time_read(), 10);
}
