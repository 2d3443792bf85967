//! Motion goals, wheel demands and command outcomes

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::{EncoderFeed, MotorDirection, MotorOutput, Wheel, MAX_PWM};
use serde::Serialize;
use util::maths::clamp;

use super::{DEG_PER_TURN, MM_PER_CM};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Target of a distance command: how far each wheel must travel and in which direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotionGoal {
    /// Distance both wheels must travel.
    ///
    /// Units: millimeters
    pub goal_mm: f64,

    pub dir_a: MotorDirection,

    pub dir_b: MotorDirection,
}

/// Distance travelled by each wheel since the encoders were last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WheelDistances {
    pub a_mm: f64,
    pub b_mm: f64,
}

/// Power and direction demanded of both wheels for one control tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveDemand {
    /// Power of wheel A in PWM counts
    pub power_a: f64,

    /// Power of wheel B in PWM counts
    pub power_b: f64,

    pub dir_a: MotorDirection,

    pub dir_b: MotorDirection,
}

/// Output of a regulator for a single tick.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    pub demand: DriveDemand,

    /// True once the command has reached its goal.
    pub done: bool,
}

/// Summary of a finished (or discarded) motion command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotionReport {
    pub outcome: MotionOutcome,

    /// Number of control ticks executed.
    pub ticks: u32,

    /// Wheel distances read on the last tick.
    pub distances: WheelDistances,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How a motion command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MotionOutcome {
    /// The command reached its goal.
    Completed,

    /// The command was aborted before reaching its goal.
    Aborted,

    /// The command was never started.
    Discarded(DiscardReason),
}

/// Reason a motion command was not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiscardReason {
    /// The goal was zero (or not a positive number).
    ZeroGoal,

    /// Another motion command was already running.
    AlreadyRunning,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotionGoal {
    /// Goal for a straight move of `distance_cm`, driving backwards if the distance is negative.
    pub fn straight(distance_cm: f64) -> Self {
        let dir = if distance_cm < 0.0 {
            MotorDirection::Reverse
        } else {
            MotorDirection::Forward
        };

        Self {
            goal_mm: (distance_cm * MM_PER_CM).abs(),
            dir_a: dir,
            dir_b: dir,
        }
    }

    /// Goal for a point turn of `angle_deg` to the right, or to the left if the angle is
    /// negative.
    pub fn point_turn(angle_deg: f64, turn_circumference_mm: f64) -> Self {
        let (dir_a, dir_b) = if angle_deg < 0.0 {
            (MotorDirection::Reverse, MotorDirection::Forward)
        } else {
            (MotorDirection::Forward, MotorDirection::Reverse)
        };

        Self {
            goal_mm: (angle_deg * turn_circumference_mm).abs() / DEG_PER_TURN,
            dir_a,
            dir_b,
        }
    }

    /// True if the goal can be driven to.
    pub fn is_valid(&self) -> bool {
        self.goal_mm > 0.0 && self.goal_mm.is_finite()
    }
}

impl WheelDistances {
    /// Read both wheels from the encoders.
    pub fn read<E: EncoderFeed>(encoders: &mut E) -> Self {
        Self {
            a_mm: encoders.distance_mm(Wheel::A),
            b_mm: encoders.distance_mm(Wheel::B),
        }
    }

    /// Mean of the two wheel distances.
    pub fn average_mm(&self) -> f64 {
        (self.a_mm + self.b_mm) / 2.0
    }
}

impl DriveDemand {
    /// Send the demand to the motors.
    ///
    /// Powers are clamped into the PWM range and truncated to whole counts.
    pub fn apply<M: MotorOutput>(&self, motors: &mut M) {
        motors.set_power(Wheel::A, self.dir_a, to_pwm(self.power_a));
        motors.set_power(Wheel::B, self.dir_b, to_pwm(self.power_b));
    }
}

impl MotionReport {
    pub(crate) fn discarded(reason: DiscardReason) -> Self {
        Self {
            outcome: MotionOutcome::Discarded(reason),
            ticks: 0,
            distances: WheelDistances::default(),
        }
    }
}

fn to_pwm(power: f64) -> u16 {
    clamp(power, 0.0, MAX_PWM as f64) as u16
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
