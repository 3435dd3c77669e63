//! MIPS simulator machine configuration CLI.
//!
//! This binary edits the stored machine configuration and builds machines from it. It performs:
//! 1. **Inspection:** `show` prints the stored configuration, `presets` lists the catalog.
//! 2. **Editing:** `preset`, `set` and `cache` change the configuration and save it.
//! 3. **Construction:** `validate` checks the configuration; `create` also probes the
//!    executable and saves.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use mipsim_machine::config::{
    CacheConfig, CacheUnit, HazardUnit, PresetCatalog, PresetId, ReplacementPolicy, WritePolicy,
};
use mipsim_machine::sim::{Machine, SessionError};
use mipsim_machine::store::JsonFileStore;
use mipsim_machine::{ConfigError, ConfigSession, MachineConfig};

#[derive(Parser, Debug)]
#[command(
    name = "mipsim",
    author,
    version,
    about = "MIPS simulator machine configuration",
    long_about = "Edit, validate and confirm the machine a MIPS simulator session builds.\n\nEvery edit is saved to the configuration file immediately.\n\nExamples:\n  mipsim preset pipelined-hazard-cache\n  mipsim set elf program.elf\n  mipsim cache data write-policy wb\n  mipsim create"
)]
struct Cli {
    /// Configuration file to read and update.
    #[arg(long, global = true, default_value = "mipsim-config.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every field, the effective core settings and the preset state.
    Show {
        /// Print the configuration as JSON instead.
        #[arg(long)]
        json: bool,
    },

    /// List the machine presets; the selected one is marked.
    Presets,

    /// Apply a preset and save.
    Preset {
        /// Preset name (see `presets`).
        id: PresetId,
    },

    /// Change a machine field and save.
    Set {
        /// Field to change.
        field: Field,
        /// New value (booleans: true/false, on/off, yes/no).
        value: String,
    },

    /// Change a cache field and save.
    Cache {
        /// Cache unit.
        unit: Unit,
        /// Field to change.
        field: CacheFieldArg,
        /// New value.
        value: String,
    },

    /// Check that a machine can be built from the stored configuration.
    Validate,

    /// Validate, probe the executable and save.
    Create,
}

/// Machine fields editable with `set`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    /// Executable path; an empty value clears it.
    Elf,
    /// Pipelined core.
    Pipelined,
    /// Branch delay slot (non-pipelined core only).
    DelaySlot,
    /// Hazard unit: none, stall or stall-forward (pipelined core only).
    HazardUnit,
    /// Memory execute protection.
    ExecProtection,
    /// Memory write protection.
    WriteProtection,
    /// Memory read access time in cycles.
    ReadTime,
    /// Memory write access time in cycles.
    WriteTime,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    /// Instruction cache.
    Program,
    /// Data cache.
    Data,
}

impl From<Unit> for CacheUnit {
    fn from(unit: Unit) -> Self {
        match unit {
            Unit::Program => Self::Program,
            Unit::Data => Self::Data,
        }
    }
}

/// Cache fields editable with `cache`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum CacheFieldArg {
    /// Cache present in the machine.
    Enabled,
    /// Number of sets.
    Sets,
    /// Block size in words.
    Blocks,
    /// Degree of associativity.
    Associativity,
    /// Replacement policy: random, lru or lfu.
    Replacement,
    /// Write policy: wt-noalloc, wt-alloc or wb (data cache only).
    WritePolicy,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("invalid value `{value}` for {field}")]
    InvalidValue { field: &'static str, value: String },

    #[error("machine created but configuration not saved")]
    Unsaved(#[source] Box<SessionError>),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

/// Installs the stderr log subscriber; `RUST_LOG` overrides the `warn` default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    tracing::debug!(store = %cli.store.display(), "opening configuration store");
    let mut session = ConfigSession::open(JsonFileStore::open_or_empty(cli.store));

    match cli.command {
        Commands::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(session.config())?);
            } else {
                show(session.config(), session.selected_preset());
            }
        }
        Commands::Presets => list_presets(session.selected_preset()),
        Commands::Preset { id } => {
            session.apply_preset(id);
            session.save()?;
            println!("applied preset {id}: {}", id.label());
        }
        Commands::Set { field, value } => {
            set_field(session.config_mut(), field, &value)?;
            session.save()?;
        }
        Commands::Cache { unit, field, value } => {
            set_cache_field(session.config_mut(), unit.into(), field, &value)?;
            session.save()?;
        }
        Commands::Validate => {
            session.config().validate()?;
            println!("configuration is valid");
        }
        Commands::Create => match session.confirm() {
            Ok(machine) => print_machine(&machine),
            Err(SessionError::NotSaved { machine, source }) => {
                print_machine(&machine);
                return Err(CliError::Unsaved(source));
            }
            Err(err) => return Err(err.into()),
        },
    }
    Ok(())
}

fn show(config: &MachineConfig, selected: Option<PresetId>) {
    let preset = selected.map_or("custom", PresetId::name);
    let elf = config
        .elf()
        .map_or_else(|| "(none)".to_owned(), |path| path.display().to_string());

    println!("preset:            {preset}");
    println!("executable:        {elf}");
    println!("pipelined:         {}", config.pipelined());
    println!(
        "delay slot:        {} (effective: {})",
        config.delay_slot(),
        config.effective_delay_slot()
    );
    println!(
        "hazard unit:       {} (effective: {})",
        config.hazard_unit(),
        config.effective_hazard_unit()
    );
    println!("exec protection:   {}", config.memory_execute_protection());
    println!("write protection:  {}", config.memory_write_protection());
    println!("read time:         {} cycles", config.memory_access_time_read());
    println!("write time:        {} cycles", config.memory_access_time_write());
    for unit in CacheUnit::ALL {
        println!("{:<19}{}", format!("{unit} cache:"), describe_cache(config.cache(unit), unit));
    }
}

fn describe_cache(cache: &CacheConfig, unit: CacheUnit) -> String {
    let state = if cache.enabled() { "enabled" } else { "disabled" };
    let text = format!(
        "{state}, {} sets x {} words x {} ways ({} words), {} replacement",
        cache.sets(),
        cache.blocks(),
        cache.associativity(),
        cache.capacity_words(),
        cache.replacement_policy()
    );
    if unit.has_write_policy() {
        format!("{text}, {}", cache.write_policy())
    } else {
        text
    }
}

fn list_presets(selected: Option<PresetId>) {
    for preset in PresetCatalog::iter() {
        let id = preset.id();
        let marker = if selected == Some(id) { '*' } else { ' ' };
        println!("{marker} {:<26} {}", id.name(), id.label());
    }
}

fn print_machine(machine: &Machine) {
    let image = machine.image();
    println!("machine created from {}", image.path().display());
    println!("  entry point: {:#010x}", image.entry());
    println!("  byte order:  {}", image.byte_order());
    println!("  sections:    {}", image.sections());
}

fn set_field(config: &mut MachineConfig, field: Field, value: &str) -> Result<(), CliError> {
    match field {
        Field::Elf => config.set_elf(value),
        Field::Pipelined => config.set_pipelined(parse_bool("pipelined", value)?),
        Field::DelaySlot => config.set_delay_slot(parse_bool("delay-slot", value)?),
        Field::HazardUnit => config.set_hazard_unit(parse_hazard_unit(value)?),
        Field::ExecProtection => {
            config.set_memory_execute_protection(parse_bool("exec-protection", value)?);
        }
        Field::WriteProtection => {
            config.set_memory_write_protection(parse_bool("write-protection", value)?);
        }
        Field::ReadTime => config.set_memory_access_time_read(parse_u32("read-time", value)?),
        Field::WriteTime => config.set_memory_access_time_write(parse_u32("write-time", value)?),
    }
    Ok(())
}

fn set_cache_field(
    config: &mut MachineConfig,
    unit: CacheUnit,
    field: CacheFieldArg,
    value: &str,
) -> Result<(), CliError> {
    let mut cache = config.access_cache(unit);
    match field {
        CacheFieldArg::Enabled => cache.set_enabled(parse_bool("enabled", value)?),
        CacheFieldArg::Sets => cache.set_sets(parse_u32("sets", value)?),
        CacheFieldArg::Blocks => cache.set_blocks(parse_u32("blocks", value)?),
        CacheFieldArg::Associativity => {
            cache.set_associativity(parse_u32("associativity", value)?);
        }
        CacheFieldArg::Replacement => cache.set_replacement_policy(parse_replacement(value)?),
        CacheFieldArg::WritePolicy => cache.set_write_policy(parse_write_policy(value)?)?,
    }
    Ok(())
}

const fn invalid(field: &'static str, value: String) -> CliError {
    CliError::InvalidValue { field, value }
}

fn parse_bool(field: &'static str, value: &str) -> Result<bool, CliError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(invalid(field, value.to_owned())),
    }
}

fn parse_u32(field: &'static str, value: &str) -> Result<u32, CliError> {
    value.parse().map_err(|_| invalid(field, value.to_owned()))
}

fn parse_hazard_unit(value: &str) -> Result<HazardUnit, CliError> {
    match value {
        "none" => Ok(HazardUnit::None),
        "stall" => Ok(HazardUnit::Stall),
        "stall-forward" => Ok(HazardUnit::StallAndForward),
        _ => Err(invalid("hazard-unit", value.to_owned())),
    }
}

fn parse_replacement(value: &str) -> Result<ReplacementPolicy, CliError> {
    match value {
        "random" => Ok(ReplacementPolicy::Random),
        "lru" => Ok(ReplacementPolicy::Lru),
        "lfu" => Ok(ReplacementPolicy::Lfu),
        _ => Err(invalid("replacement", value.to_owned())),
    }
}

fn parse_write_policy(value: &str) -> Result<WritePolicy, CliError> {
    match value {
        "wt-noalloc" => Ok(WritePolicy::WriteThroughNoAllocate),
        "wt-alloc" => Ok(WritePolicy::WriteThroughAllocate),
        "wb" => Ok(WritePolicy::WriteBack),
        _ => Err(invalid("write-policy", value.to_owned())),
    }
}
