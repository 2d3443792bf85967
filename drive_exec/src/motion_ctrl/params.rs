//! Motion control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the motion controller.
///
/// Every field has a default, so a parameter file only needs to name the values it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Rate at which the control loop runs.
    ///
    /// Units: Hz
    pub loop_frequency_hz: f64,

    /// Initial controller gains.
    pub gains: ControllerGains,

    /// Limit on the magnitude of the distance regulator's integral term.
    pub integral_limit: f64,

    /// Power ceiling applied near the start and the goal of a move.
    pub ramp: RampParams,

    /// Distance each wheel travels during a full point turn of the chassis, that is the
    /// circumference of the circle with the wheel track as diameter.
    ///
    /// Units: millimeters
    pub turn_circumference_mm: f64,

    /// Goal given to the drive command of `forward_until`, which is expected to be aborted long
    /// before reaching it.
    ///
    /// Units: millimeters
    pub unbounded_goal_mm: f64,

    /// Wall following regulator parameters.
    pub wall_follow: WallFollowParams,
}

/// Gains of the distance and differential regulators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerGains {
    /// Proportional gain of the distance regulator
    pub p: f64,

    /// Integral gain of the distance regulator
    pub i: f64,

    /// Derivative gain of the distance regulator
    pub d: f64,

    /// Proportional gain of the differential regulator
    pub p_diff: f64,
}

/// Shape of the power ramp.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RampParams {
    /// Distance from the start or the goal inside which the ramp applies.
    ///
    /// Units: millimeters
    pub window_mm: f64,

    /// Power ceiling at the start and at the goal.
    ///
    /// Units: PWM counts
    pub floor_pwm: f64,

    /// Increase of the ceiling per millimeter away from the start or goal.
    ///
    /// Units: PWM counts/millimeter
    pub slope_pwm_per_mm: f64,

    /// Ceiling outside the ramp window.
    ///
    /// Units: PWM counts
    pub full_scale_pwm: f64,
}

/// Parameters of the wall following regulator.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WallFollowParams {
    /// Power given to both wheels when on the set point.
    ///
    /// Units: percent
    pub base_power_pct: f64,

    /// The distance error is divided by this before being added to the base power.
    pub error_divisor: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            loop_frequency_hz: 50.0,
            gains: ControllerGains::default(),
            integral_limit: 100.0,
            ramp: RampParams::default(),
            turn_circumference_mm: 487.0,
            unbounded_goal_mm: 100_000.0,
            wall_follow: WallFollowParams::default(),
        }
    }
}

impl Default for ControllerGains {
    fn default() -> Self {
        Self {
            p: 4.0,
            i: 5.0,
            d: 0.0,
            p_diff: 80.0,
        }
    }
}

impl Default for RampParams {
    fn default() -> Self {
        Self {
            window_mm: 30.0,
            floor_pwm: 500.0,
            slope_pwm_per_mm: 20.0,
            full_scale_pwm: comms_if::eqpt::MAX_PWM as f64,
        }
    }
}

impl Default for WallFollowParams {
    fn default() -> Self {
        Self {
            base_power_pct: 50.0,
            error_divisor: 2.0,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_params_file() {
        let params: Params = util::params::from_toml_str(
            r#"
            loop_frequency_hz = 100.0

            [gains]
            p = 2.0
            i = 0.5
            d = 0.0
            p_diff = 40.0

            [ramp]
            window_mm = 50.0
            "#,
        )
        .unwrap();

        assert_eq!(params.loop_frequency_hz, 100.0);
        assert_eq!(params.gains.p_diff, 40.0);
        assert_eq!(params.ramp.window_mm, 50.0);

        // Unnamed values keep their defaults
        assert_eq!(params.ramp.floor_pwm, 500.0);
        assert_eq!(params.integral_limit, 100.0);
        assert_eq!(params.turn_circumference_mm, 487.0);
        assert_eq!(params.wall_follow.base_power_pct, 50.0);
    }
}
