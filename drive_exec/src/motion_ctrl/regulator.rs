//! Distance, differential and ramp regulation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use util::maths::{clamp, clamp_sym};

use super::{ControllerGains, DriveDemand, MotionGoal, Params, RampParams, Tick, WheelDistances};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A controller run once per tick of a motion command.
pub trait Regulator {
    /// Compute the demand for this tick from the wheel distances read at its start.
    fn tick(&mut self, distances: WheelDistances) -> Tick;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Transient state of the distance PID, owned by the running command.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopState {
    pub integral_error: f64,
    pub previous_error: f64,
    pub done: bool,
}

/// Drives both wheels the same distance towards a goal.
///
/// The average wheel power comes from a PID on the distance error, the split between the wheels
/// from a proportional term on the difference of their distances, and the ceiling on both from
/// the ramp.
#[derive(Debug, Clone)]
pub struct DistanceRegulator {
    goal: MotionGoal,
    gains: ControllerGains,
    integral_limit: f64,
    ramp: RampParams,
    state: LoopState,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DistanceRegulator {
    /// Create a regulator for `goal` using a snapshot of `gains`.
    pub fn new(goal: MotionGoal, gains: ControllerGains, params: &Params) -> Self {
        Self {
            goal,
            gains,
            integral_limit: params.integral_limit,
            ramp: params.ramp,
            state: LoopState::default(),
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn goal(&self) -> &MotionGoal {
        &self.goal
    }

    /// Run the PID on the distance error, returning the average power to apply.
    fn average_power(&mut self, error_mm: f64) -> f64 {
        // Drop the accumulated error once the goal has been overshot
        if error_mm < 0.0 {
            self.state.integral_error = 0.0;
        }

        self.state.integral_error =
            clamp_sym(self.state.integral_error + error_mm, self.integral_limit);

        let power = self.gains.p * error_mm
            + self.gains.i * self.state.integral_error
            + self.gains.d * (self.state.previous_error - error_mm);

        self.state.previous_error = error_mm;

        power
    }
}

impl Regulator for DistanceRegulator {
    fn tick(&mut self, distances: WheelDistances) -> Tick {
        let goal_mm = self.goal.goal_mm;
        let error_mm = goal_mm - distances.average_mm();

        let avg_power = self.average_power(error_mm);
        let diff_power = self.gains.p_diff * (distances.a_mm - distances.b_mm);
        let max_power = ramp_max_power(error_mm, goal_mm, &self.ramp);

        let (power_a, power_b) = split_differential(avg_power, diff_power, max_power);

        self.state.done = distances.a_mm >= goal_mm && distances.b_mm >= goal_mm;

        trace!(
            "e: {:.2} mm, I: {:.2}, avg: {:.1}, diff: {:.1}, max: {:.1}, A: {:.1}, B: {:.1}",
            error_mm,
            self.state.integral_error,
            avg_power,
            diff_power,
            max_power,
            power_a,
            power_b
        );

        Tick {
            demand: DriveDemand {
                power_a,
                power_b,
                dir_a: self.goal.dir_a,
                dir_b: self.goal.dir_b,
            },
            done: self.state.done,
        }
    }
}

/// True if `error_mm` lies inside the ramp window at either end of a move of `goal_mm`.
pub fn in_ramp_window(error_mm: f64, goal_mm: f64, ramp: &RampParams) -> bool {
    error_mm < ramp.window_mm || error_mm > goal_mm - ramp.window_mm
}

/// Power ceiling for a remaining distance `error_mm` out of `goal_mm`.
///
/// Inside the ramp window the ceiling rises from the floor with the distance to the nearest end
/// of the move, and never exceeds the full scale.
pub fn ramp_max_power(error_mm: f64, goal_mm: f64, ramp: &RampParams) -> f64 {
    if in_ramp_window(error_mm, goal_mm, ramp) {
        let dist = error_mm.min(goal_mm - error_mm);
        clamp(
            ramp.floor_pwm + dist * ramp.slope_pwm_per_mm,
            0.0,
            ramp.full_scale_pwm,
        )
    } else {
        ramp.full_scale_pwm
    }
}

/// Split the average power between the wheels, powering up the wheel that lags behind.
///
/// `diff_power` is positive when wheel A is ahead. The lagging wheel is clamped first and the
/// leading wheel is set relative to it, so the lagging wheel keeps its correction when the
/// ceiling is hit.
pub fn split_differential(avg_power: f64, diff_power: f64, max_power: f64) -> (f64, f64) {
    if diff_power > 0.0 {
        let power_b = clamp(avg_power + diff_power, 0.0, max_power);
        let power_a = clamp(power_b - diff_power, 0.0, max_power);
        (power_a, power_b)
    } else {
        let power_a = clamp(avg_power - diff_power, 0.0, max_power);
        let power_b = clamp(power_a + diff_power, 0.0, max_power);
        (power_a, power_b)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::MotorDirection;

    fn regulator(goal_mm: f64, gains: ControllerGains) -> DistanceRegulator {
        let goal = MotionGoal {
            goal_mm,
            dir_a: MotorDirection::Forward,
            dir_b: MotorDirection::Forward,
        };
        DistanceRegulator::new(goal, gains, &Params::default())
    }

    fn dist(a_mm: f64, b_mm: f64) -> WheelDistances {
        WheelDistances { a_mm, b_mm }
    }

    #[test]
    fn test_integral_clamp() {
        let gains = ControllerGains {
            p: 0.0,
            i: 1.0,
            d: 0.0,
            p_diff: 0.0,
        };
        let mut reg = regulator(1000.0, gains);

        reg.tick(dist(920.0, 920.0));
        assert_eq!(reg.state().integral_error, 80.0);

        reg.tick(dist(920.0, 920.0));
        assert_eq!(reg.state().integral_error, 100.0);
        assert_eq!(reg.state().previous_error, 80.0);
    }

    #[test]
    fn test_anti_windup() {
        let gains = ControllerGains {
            p: 0.0,
            i: 1.0,
            d: 0.0,
            p_diff: 0.0,
        };
        let mut reg = regulator(100.0, gains);

        reg.tick(dist(50.0, 50.0));
        assert_eq!(reg.state().integral_error, 50.0);

        // Overshooting drops the accumulated error before adding the new one
        let tick = reg.tick(dist(120.0, 120.0));
        assert_eq!(reg.state().integral_error, -20.0);
        assert_eq!(tick.demand.power_a, 0.0);
        assert_eq!(tick.demand.power_b, 0.0);
        assert!(tick.done);
    }

    #[test]
    fn test_derivative_term() {
        let gains = ControllerGains {
            p: 0.0,
            i: 0.0,
            d: 2.0,
            p_diff: 0.0,
        };
        let mut reg = regulator(10_000.0, gains);

        // First tick compares against a zero previous error
        let mut power = reg.average_power(5000.0);
        assert_eq!(power, -10_000.0);

        power = reg.average_power(4990.0);
        assert_eq!(power, 20.0);
    }

    #[test]
    fn test_differential_sign() {
        let mut reg = regulator(1000.0, ControllerGains::default());

        // A ahead of B, B must get more power
        let tick = reg.tick(dist(10.0, 5.0));
        assert_eq!(tick.demand.power_b, 650.0);
        assert_eq!(tick.demand.power_a, 250.0);

        // Unsaturated, the split is exactly the differential power
        let gains = ControllerGains {
            p: 0.1,
            i: 0.0,
            d: 0.0,
            p_diff: 1.0,
        };
        let mut reg = regulator(1000.0, gains);
        let tick = reg.tick(dist(490.0, 500.0));
        assert!(tick.demand.power_a > tick.demand.power_b);
        assert!((tick.demand.power_a - tick.demand.power_b - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_split_saturation() {
        // The lagging wheel is clamped first
        assert_eq!(split_differential(1000.0, 200.0, 1023.0), (823.0, 1023.0));
        assert_eq!(split_differential(1000.0, -200.0, 1023.0), (1023.0, 823.0));
        assert_eq!(split_differential(-50.0, 80.0, 1023.0), (0.0, 30.0));
        assert_eq!(split_differential(300.0, 0.0, 1023.0), (300.0, 300.0));
    }

    #[test]
    fn test_ramp() {
        let ramp = RampParams::default();
        let goal_mm = 10_000.0;

        // Cruise just outside the window
        assert!(!in_ramp_window(31.0, goal_mm, &ramp));
        assert_eq!(ramp_max_power(31.0, goal_mm, &ramp), 1023.0);

        // Just inside the window the ramp value is above the full scale and is clamped to it
        assert!(in_ramp_window(29.0, goal_mm, &ramp));
        assert_eq!(ramp_max_power(29.0, goal_mm, &ramp), 1023.0);

        // Deeper in the ceiling drops
        assert_eq!(ramp_max_power(20.0, goal_mm, &ramp), 900.0);
        assert_eq!(ramp_max_power(5.0, goal_mm, &ramp), 600.0);

        // At the start of the move the ceiling is the floor
        assert_eq!(ramp_max_power(goal_mm, goal_mm, &ramp), 500.0);
        assert!(in_ramp_window(goal_mm - 10.0, goal_mm, &ramp));
        assert_eq!(ramp_max_power(goal_mm - 10.0, goal_mm, &ramp), 700.0);

        // Overshoot collapses the ceiling
        assert_eq!(ramp_max_power(-30.0, goal_mm, &ramp), 0.0);
    }

    #[test]
    fn test_done_needs_both_wheels() {
        let mut reg = regulator(100.0, ControllerGains::default());

        assert!(!reg.tick(dist(120.0, 99.0)).done);
        assert!(!reg.state().done);
        assert!(reg.tick(dist(100.0, 100.0)).done);
        assert!(reg.state().done);
    }
}
