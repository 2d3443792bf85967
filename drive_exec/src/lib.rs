//! # Drive library.
//!
//! Motion control for a two wheel differential drive robot, plus the hardware adapters and the
//! simulated chassis it can be run against. The executable and tests access everything through
//! this library.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Hardware adapters - H-bridge motor output and edge counting wheel encoders
pub mod hw;

/// Motion control module - turns motion commands into wheel power demands using encoder feedback
pub mod motion_ctrl;

/// Conversion of analog range sensor samples into distances
pub mod range_sensor;

/// Simulated chassis - a kinematic two wheel robot driving beside a straight wall
pub mod sim;

#[cfg(test)]
mod test_eqpt;
