//! # Drive Equipment
//!
//! Wheel identifiers and the three collaborators of the motion controller: the encoder feed, the
//! motor output and the analog range sensor.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Full scale PWM value accepted by a [`MotorOutput`].
pub const MAX_PWM: u16 = 1023;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// One of the two independently driven wheels of the chassis.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum Wheel {
    /// Wheel A, the left wheel
    A,
    /// Wheel B, the right wheel
    B,
}

/// Direction a wheel is driven in.
///
/// Forward and reverse are relative to how the motor is wired, not to the chassis.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
pub enum MotorDirection {
    Forward,
    Reverse,
}

/// Side of the chassis a wall is on when wall following.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Per-wheel cumulative pulse counters and the distances derived from them.
///
/// Counters only ever increase while the wheel turns, whatever the direction, until
/// [`EncoderFeed::reset_counters`] is called.
pub trait EncoderFeed {
    /// Zero both wheels' counters.
    fn reset_counters(&mut self);

    /// Distance travelled by the wheel since the last reset.
    ///
    /// Units: millimeters
    fn distance_mm(&mut self, wheel: Wheel) -> f64;

    /// Raw number of pulses counted since the last reset.
    fn pulse_count(&mut self, wheel: Wheel) -> u32;

    /// Set the calibration used to convert pulses into distance.
    fn set_pulses_per_meter(&mut self, wheel: Wheel, pulses_per_meter: f64);
}

/// Applies power to the drive motors.
pub trait MotorOutput {
    /// Drive `wheel` in `direction` with `pwm` in `[0, MAX_PWM]`.
    fn set_power(&mut self, wheel: Wheel, direction: MotorDirection, pwm: u16);

    /// Remove power from `wheel`.
    fn stop(&mut self, wheel: Wheel);
}

/// A single analog range sensor.
pub trait RangeSensor {
    /// Take a raw analog sample from the sensor.
    fn read_raw(&mut self) -> u16;
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Wheel {
    /// Both wheels, A first.
    pub const BOTH: [Wheel; 2] = [Wheel::A, Wheel::B];
}
