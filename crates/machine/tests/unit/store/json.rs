//! # JSON File Store Tests
//!
//! Tests for the on-disk store: persistence across reopen, corrupt files and
//! the dirty tracking that decides when the file is rewritten.

use std::fs;

use mipsim_machine::config::{PresetCatalog, PresetId};
use mipsim_machine::store::{JsonFileStore, StoreError, StoreValue};
use mipsim_machine::{ConfigStore, MachineConfig};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use crate::common::{custom_config, init_tracing};

#[test]
fn test_missing_file_is_empty() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::open(dir.path().join("config.json")).unwrap();
    assert!(store.is_empty());
    assert!(!store.is_dirty());
}

#[test]
fn test_values_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let mut store = JsonFileStore::open(&path).unwrap();
    store.set("Pipelined", StoreValue::Bool(true)).unwrap();
    store.set("Cache.Data.Sets", StoreValue::UInt(64)).unwrap();
    store.set("ElfPath", StoreValue::from("/bin/a.out")).unwrap();
    assert!(store.is_dirty());
    store.flush().unwrap();
    assert!(!store.is_dirty());

    let reopened = JsonFileStore::open(&path).unwrap();
    assert_eq!(reopened.len(), 3);
    assert_eq!(reopened.get("Pipelined").unwrap(), Some(StoreValue::Bool(true)));
    assert_eq!(reopened.get("Cache.Data.Sets").unwrap(), Some(StoreValue::UInt(64)));
    assert_eq!(reopened.get("ElfPath").unwrap(), Some(StoreValue::from("/bin/a.out")));
}

#[test]
fn test_file_is_a_flat_object() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    let mut store = JsonFileStore::open(&path).unwrap();
    store.set("Preset", StoreValue::UInt(2)).unwrap();
    store.flush().unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json, serde_json::json!({ "Preset": 2 }));
    assert!(!dir.path().join("config.json.tmp").exists());
}

#[test]
fn test_unchanged_set_is_not_dirty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "Pipelined": false }"#).unwrap();

    let mut store = JsonFileStore::open(&path).unwrap();
    store.set("Pipelined", StoreValue::Bool(false)).unwrap();
    assert!(!store.is_dirty());
}

#[test]
fn test_corrupt_file_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();

    assert!(matches!(JsonFileStore::open(&path), Err(StoreError::Parse { .. })));

    init_tracing();
    let store = JsonFileStore::open_or_empty(&path);
    assert!(store.is_empty());
    assert_eq!(MachineConfig::load(&store), MachineConfig::default());
}

#[test]
fn test_negative_number_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "MemoryAccessTimeRead": -1 }"#).unwrap();
    assert!(matches!(JsonFileStore::open(&path), Err(StoreError::Parse { .. })));
}

#[test]
fn test_machine_config_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let custom = custom_config(&dir.path().join("program.elf"));
    let mut store = JsonFileStore::open(&path).unwrap();
    custom.store(&mut store).unwrap();
    store.flush().unwrap();
    assert_eq!(MachineConfig::load(&JsonFileStore::open(&path).unwrap()), custom);

    let preset = PresetCatalog::apply(PresetId::PipelinedWithHazardAndCache);
    preset.store(&mut store).unwrap();
    store.flush().unwrap();
    let loaded = MachineConfig::load(&JsonFileStore::open(&path).unwrap());
    assert!(!loaded.is_custom());
    assert_eq!(loaded.preset(), Some(PresetId::PipelinedWithHazardAndCache));
}

#[test]
fn test_type_mismatch_in_file_falls_back_to_defaults() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "Preset": 0, "Pipelined": "yes" }"#).unwrap();

    let store = JsonFileStore::open(&path).unwrap();
    assert_eq!(MachineConfig::load(&store), MachineConfig::default());
}
