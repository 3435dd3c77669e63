//! Configuration sessions.
//!
//! A session is what a configuration front end drives: it loads the stored
//! configuration, lets the caller edit it, and on confirmation validates it,
//! probes the executable and persists the result. Nothing is persisted when
//! the machine cannot be built.

use std::path::PathBuf;

use thiserror::Error;

use super::loader::{ElfImage, LoadError};
use crate::common::{ConfigError, ElfPathProblem};
use crate::config::{MachineConfig, PresetId};
use crate::store::{ConfigStore, StoreError};

/// A configuration accepted for construction, with its probed executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    config: MachineConfig,
    image: ElfImage,
}

impl Machine {
    /// Configuration the machine is built from.
    pub const fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Executable the machine starts.
    pub const fn image(&self) -> &ElfImage {
        &self.image
    }
}

/// Failures reported by a configuration session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The configuration is invalid or could not be stored.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The executable could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The store rejected the flush.
    #[error("failed to flush the configuration store")]
    Flush(#[source] StoreError),

    /// The machine was built but the configuration was not persisted.
    #[error("machine created but configuration not saved")]
    NotSaved {
        /// The machine that was built.
        machine: Box<Machine>,
        /// Why saving failed.
        #[source]
        source: Box<SessionError>,
    },
}

/// Owns a configuration being edited and the store it is persisted to.
#[derive(Debug)]
pub struct ConfigSession<S: ConfigStore> {
    config: MachineConfig,
    store: S,
}

impl<S: ConfigStore> ConfigSession<S> {
    /// Starts a session from the configuration held by `store`.
    pub fn open(store: S) -> Self {
        let config = MachineConfig::load(&store);
        Self { config, store }
    }

    /// Configuration being edited.
    pub const fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Mutable access to the configuration being edited.
    pub const fn config_mut(&mut self) -> &mut MachineConfig {
        &mut self.config
    }

    /// Backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Ends the session, returning the backing store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Applies the preset `id` to the configuration being edited.
    pub fn apply_preset(&mut self, id: PresetId) {
        self.config.apply_preset(id);
    }

    /// Preset to show as selected: `None` while the configuration is custom.
    pub fn selected_preset(&self) -> Option<PresetId> {
        if self.config.is_custom() {
            None
        } else {
            self.config.preset()
        }
    }

    /// Writes the configuration to the store and flushes it.
    ///
    /// # Errors
    ///
    /// `Config` when a key cannot be written, `Flush` when the store cannot be flushed.
    pub fn save(&mut self) -> Result<(), SessionError> {
        self.config.store(&mut self.store)?;
        self.store.flush().map_err(SessionError::Flush)
    }

    /// Validates the configuration, probes the executable and persists on success.
    ///
    /// # Errors
    ///
    /// `Config` or `Load` when the machine cannot be built; nothing is stored.
    /// `NotSaved` when the machine was built but persisting failed; the edited
    /// configuration is kept.
    pub fn confirm(&mut self) -> Result<Machine, SessionError> {
        self.config.validate()?;
        let path = self.config.elf().ok_or_else(|| ConfigError::InvalidElfPath {
            path: PathBuf::new(),
            reason: ElfPathProblem::Empty,
        })?;
        let image = ElfImage::probe(path)?;
        let machine = Machine {
            config: self.config.clone(),
            image,
        };

        if let Err(err) = self.save() {
            tracing::warn!(error = %err, "machine created but configuration not saved");
            return Err(SessionError::NotSaved {
                machine: Box::new(machine),
                source: Box::new(err),
            });
        }
        tracing::debug!(entry = machine.image.entry(), "machine configuration confirmed");
        Ok(machine)
    }

    /// Discards unsaved edits by reloading the configuration from the store.
    pub fn cancel(&mut self) {
        self.config = MachineConfig::load(&self.store);
        tracing::debug!("configuration edits discarded");
    }
}
