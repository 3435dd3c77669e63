//! Shared fixtures for configuration tests.

use std::io::Write;
use std::path::Path;

use mipsim_machine::MachineConfig;
use mipsim_machine::config::{HazardUnit, ReplacementPolicy, WritePolicy};
use tempfile::NamedTempFile;

/// Mock implementations of store backends.
pub mod mocks;

/// `e_machine` value for MIPS.
pub const EM_MIPS: u16 = 8;
/// `e_machine` value for ARM.
pub const EM_ARM: u16 = 40;
/// Entry point written into synthetic executables.
pub const ENTRY: u32 = 0x0040_0000;

/// Builds a minimal 32-bit ELF executable header with no segments or sections.
pub fn elf32_header(machine: u16, big_endian: bool, entry: u32) -> Vec<u8> {
    let half = |v: u16| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() };
    let word = |v: u32| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() };

    let mut data = vec![0x7F, b'E', b'L', b'F', 1, if big_endian { 2 } else { 1 }, 1, 0];
    data.resize(16, 0);
    data.extend_from_slice(&half(2)); // e_type: executable
    data.extend_from_slice(&half(machine));
    data.extend_from_slice(&word(1)); // e_version
    data.extend_from_slice(&word(entry));
    data.extend_from_slice(&word(0)); // e_phoff
    data.extend_from_slice(&word(0)); // e_shoff
    data.extend_from_slice(&word(0)); // e_flags
    data.extend_from_slice(&half(52)); // e_ehsize
    data.extend_from_slice(&half(32)); // e_phentsize
    data.extend_from_slice(&half(0)); // e_phnum
    data.extend_from_slice(&half(40)); // e_shentsize
    data.extend_from_slice(&half(0)); // e_shnum
    data.extend_from_slice(&half(0)); // e_shstrndx
    data
}

/// Builds the identification bytes of a 64-bit little-endian ELF file.
pub fn elf64_ident() -> Vec<u8> {
    let mut data = vec![0x7F, b'E', b'L', b'F', 2, 1, 1, 0];
    data.resize(64, 0);
    data
}

/// Writes `data` to a temporary file.
pub fn temp_file(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}

/// A big-endian MIPS32 executable on disk.
pub fn mips_elf() -> NamedTempFile {
    temp_file(&elf32_header(EM_MIPS, true, ENTRY))
}

/// A configuration that matches no preset, touching every field.
pub fn custom_config(elf: &Path) -> MachineConfig {
    let mut config = MachineConfig::default();
    config.set_elf(elf);
    config.set_pipelined(true);
    config.set_delay_slot(false);
    config.set_hazard_unit(HazardUnit::Stall);
    config.set_memory_execute_protection(true);
    config.set_memory_write_protection(true);
    config.set_memory_access_time_read(3);
    config.set_memory_access_time_write(7);
    {
        let mut cache = config.access_cache_program();
        cache.set_enabled(true);
        cache.set_sets(8);
        cache.set_blocks(4);
        cache.set_associativity(1);
        cache.set_replacement_policy(ReplacementPolicy::Lru);
    }
    {
        let mut cache = config.access_cache_data();
        cache.set_enabled(true);
        cache.set_sets(16);
        cache.set_blocks(2);
        cache.set_associativity(4);
        cache.set_replacement_policy(ReplacementPolicy::Lfu);
        cache.set_write_policy(WritePolicy::WriteBack).unwrap();
    }
    config
}

/// Installs a test log subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
