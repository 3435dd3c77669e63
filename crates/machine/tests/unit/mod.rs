//! # Unit Components
//!
//! This module organizes the unit tests by model area: configuration
//! structures, store backends, and machine construction.
