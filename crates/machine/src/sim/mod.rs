//! Machine construction.
//!
//! This module turns a validated configuration into a buildable machine. It provides:
//! 1. **Loader:** `ElfImage::probe`, which checks that the executable is a 32-bit MIPS ELF.
//! 2. **Session:** `ConfigSession`, which owns a configuration and its store and
//!    validates, builds and persists on confirmation.

/// ELF probing.
pub mod loader;
/// Configuration sessions.
pub mod session;

pub use loader::{ByteOrder, ElfImage, LoadError};
pub use session::{ConfigSession, Machine, SessionError};
