//! ELF probing.
//!
//! The configuration model only checks that the executable path names a readable
//! file. Before a machine is built the file itself is inspected: it must be a
//! 32-bit ELF image for the MIPS architecture.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use object::read::elf::ElfFile32;
use object::{Architecture, Endianness, FileKind, Object};
use thiserror::Error;

/// Byte order of an ELF image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Little => f.write_str("little-endian"),
            Self::Big => f.write_str("big-endian"),
        }
    }
}

/// Reasons an executable cannot be loaded into a machine.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("could not read {}: {source}", .path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The file does not start with an ELF header.
    #[error("not an ELF file")]
    NotElf,

    /// The ELF header or section table is malformed.
    #[error("malformed ELF file: {0}")]
    Parse(String),

    /// The file is a 64-bit ELF image.
    #[error("not a 32-bit ELF file")]
    Not32Bit,

    /// The file targets another architecture.
    #[error("not a MIPS executable (architecture: {0})")]
    NotMips(String),
}

/// Header facts about an executable accepted for loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfImage {
    path: PathBuf,
    entry: u32,
    byte_order: ByteOrder,
    sections: usize,
}

impl ElfImage {
    /// Reads and inspects the executable at `path`.
    ///
    /// # Errors
    ///
    /// `LoadError::Io` when the file cannot be read, otherwise see [`ElfImage::parse`].
    pub fn probe(path: &Path) -> Result<Self, LoadError> {
        let data = fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &data)
    }

    /// Inspects an in-memory executable that was read from `path`.
    ///
    /// # Errors
    ///
    /// `NotElf` for non-ELF data, `Not32Bit` for ELF64, `NotMips` for another
    /// architecture and `Parse` for a malformed header.
    pub fn parse(path: &Path, data: &[u8]) -> Result<Self, LoadError> {
        match FileKind::parse(data) {
            Ok(FileKind::Elf32) => {}
            Ok(FileKind::Elf64) => return Err(LoadError::Not32Bit),
            _ => return Err(LoadError::NotElf),
        }

        let elf: ElfFile32<'_, Endianness> =
            ElfFile32::parse(data).map_err(|err| LoadError::Parse(err.to_string()))?;
        match elf.architecture() {
            Architecture::Mips => {}
            other => return Err(LoadError::NotMips(format!("{other:?}"))),
        }

        let entry = u32::try_from(elf.entry())
            .map_err(|_| LoadError::Parse("entry point exceeds 32 bits".into()))?;
        let byte_order = if elf.is_little_endian() {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        };
        let image = Self {
            path: path.to_path_buf(),
            entry,
            byte_order,
            sections: elf.sections().count(),
        };

        tracing::debug!(
            path = %path.display(),
            entry,
            byte_order = %byte_order,
            "probed MIPS executable"
        );
        Ok(image)
    }

    /// File the image was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Program entry point.
    pub const fn entry(&self) -> u32 {
        self.entry
    }

    /// Byte order of the image.
    pub const fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Number of section headers, including the null section.
    pub const fn sections(&self) -> usize {
        self.sections
    }
}
