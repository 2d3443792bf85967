//! # Equipment Interface
//!
//! This module defines the interfaces the motion controller uses to talk to the drive equipment.
//! The controller only ever sees these traits, so the same control code runs against the real
//! chassis, the simulation, or a test double.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod drive;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use drive::*;
