//! Wall following

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::{EncoderFeed, MotorDirection, MotorOutput, RangeSensor, Side, MAX_PWM};
use log::{debug, info, trace};
use util::maths::{clamp, lin_map};

use super::{
    DiscardReason, DriveDemand, MotionCtrl, MotionReport, Regulator, Tick, WallFollowParams,
    WheelDistances, MM_PER_CM,
};
use crate::range_sensor::read_range_mm;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const MAX_POWER_PCT: f64 = 100.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Holds the distance to a wall measured when the command started, while driving forward a set
/// distance.
pub struct WallFollower<'s, S> {
    sensor: &'s mut S,
    side: Side,

    /// Distance to the wall to hold.
    ///
    /// Units: millimeters
    set_point_mm: f64,

    /// Distance to travel along the wall.
    ///
    /// Units: centimeters
    travel_cm: f64,

    params: WallFollowParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<'s, S: RangeSensor> WallFollower<'s, S> {
    /// Create a follower holding the distance `sensor` reads now.
    pub fn new(sensor: &'s mut S, side: Side, travel_cm: f64, params: WallFollowParams) -> Self {
        let set_point_mm = read_range_mm(&mut *sensor);

        Self {
            sensor,
            side,
            set_point_mm,
            travel_cm,
            params,
        }
    }

    pub fn set_point_mm(&self) -> f64 {
        self.set_point_mm
    }

    /// Percent power of wheels A and B for a wall at `distance_mm`.
    ///
    /// Getting closer to the wall speeds up the wheel on the wall's side.
    pub fn power_pct(&self, distance_mm: f64) -> (f64, f64) {
        let mut err = (self.set_point_mm - distance_mm) / self.params.error_divisor;

        // Wheel A is the left wheel
        if self.side == Side::Right {
            err = -err;
        }

        (
            clamp(self.params.base_power_pct + err, 0.0, MAX_POWER_PCT),
            clamp(self.params.base_power_pct - err, 0.0, MAX_POWER_PCT),
        )
    }

    /// True once the average wheel distance covers the travel distance.
    pub fn travelled(&self, distances: WheelDistances) -> bool {
        (distances.a_mm + distances.b_mm) / (2.0 * MM_PER_CM) >= self.travel_cm
    }
}

impl<'s, S: RangeSensor> Regulator for WallFollower<'s, S> {
    fn tick(&mut self, distances: WheelDistances) -> Tick {
        let distance_mm = read_range_mm(&mut *self.sensor);
        let (pct_a, pct_b) = self.power_pct(distance_mm);

        trace!(
            "wall: {:.1} mm (set point {:.1} mm), A: {:.1} %, B: {:.1} %",
            distance_mm,
            self.set_point_mm,
            pct_a,
            pct_b
        );

        Tick {
            demand: DriveDemand {
                power_a: percent_to_pwm(pct_a),
                power_b: percent_to_pwm(pct_b),
                dir_a: MotorDirection::Forward,
                dir_b: MotorDirection::Forward,
            },
            done: self.travelled(distances),
        }
    }
}

impl<E, M> MotionCtrl<E, M>
where
    E: EncoderFeed,
    M: MotorOutput,
{
    /// Drive forward `distance_cm` keeping the wall on `side` at the distance `sensor` reads when
    /// the command starts.
    pub fn follow_wall<S: RangeSensor>(
        &self,
        side: Side,
        distance_cm: f64,
        sensor: &mut S,
    ) -> MotionReport {
        const LABEL: &str = "Follow wall";

        if !(distance_cm > 0.0 && distance_cm.is_finite()) {
            debug!("{} discarded, distance of {} cm", LABEL, distance_cm);
            return MotionReport::discarded(DiscardReason::ZeroGoal);
        }

        let token = match self.acquire(LABEL) {
            Ok(t) => t,
            Err(reason) => return MotionReport::discarded(reason),
        };

        let regulator = WallFollower::new(sensor, side, distance_cm, self.params().wall_follow);
        self.reset_encoders();

        info!(
            "{} started: {:.1} cm with the wall {:.1} mm on the {:?}",
            LABEL,
            distance_cm,
            regulator.set_point_mm(),
            side
        );

        self.run(token, regulator, LABEL)
    }
}

/// Convert a percentage of full power into PWM counts.
pub fn percent_to_pwm(pct: f64) -> f64 {
    lin_map(
        (0.0, MAX_POWER_PCT),
        (0.0, MAX_PWM as f64),
        clamp(pct, 0.0, MAX_POWER_PCT),
    )
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
