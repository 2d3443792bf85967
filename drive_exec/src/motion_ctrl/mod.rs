//! # Motion control module
//!
//! Runs one motion command at a time against the drive equipment. Each command is a closed loop
//! executed at a fixed rate: the wheel distances are read, a regulator computes the power to send
//! to each wheel, and the power is applied, until the regulator reports the command done or the
//! command is aborted.
//!
//! Two regulators are provided:
//!
//! - [`DistanceRegulator`] - a PID on the average wheel distance, with a proportional
//!   differential term keeping both wheels level and a ramp limiting power near the start and the
//!   goal. Used by straight moves and point turns.
//! - [`WallFollower`] - a proportional controller holding the distance to a wall read by a range
//!   sensor.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd;
mod cmd_exec;
mod forward_until;
mod params;
mod regulator;
mod run_token;
mod state;
mod wall_follow;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use cmd::*;
pub use params::*;
pub use regulator::*;
pub use state::*;
pub use wall_follow::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Millimeters in a centimeter, used to convert command distances into goals.
pub const MM_PER_CM: f64 = 10.0;

/// Degrees in a full turn of the chassis.
pub const DEG_PER_TURN: f64 = 360.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur when creating a [`MotionCtrl`].
#[derive(Debug, thiserror::Error)]
pub enum MotionCtrlError {
    #[error("The loop frequency must be a positive number of Hz, found {0}")]
    InvalidLoopFrequency(f64),

    #[error("Invalid motion control parameter {0}: {1}")]
    InvalidParam(&'static str, f64),
}
