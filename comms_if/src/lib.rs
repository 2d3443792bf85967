//! # Communications interface crate.
//!
//! Provides the interfaces shared between the drive executable, its hardware and the scripts that
//! command it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommand definitions
pub mod tc;

/// Interfaces to the drive equipment (encoders, motors, range sensor)
pub mod eqpt;
