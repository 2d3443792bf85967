//! # Hardware adapters
//!
//! Implementations of the drive equipment traits for real hardware. Motors are driven through
//! `embedded-hal` pins so any HAL providing PWM and GPIO outputs can be used.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// [`comms_if::eqpt::MotorOutput`] for a dual H-bridge driven by one PWM and one direction pin
/// per motor.
pub mod hbridge;

/// [`comms_if::eqpt::EncoderFeed`] counting encoder edges.
pub mod pulse_encoder;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use hbridge::{HBridgeChannel, HBridgeMotors};
pub use pulse_encoder::{PulseCounters, PulseEncoders, DEFAULT_PULSES_PER_METER};
