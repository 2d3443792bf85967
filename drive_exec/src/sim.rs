//! # Simulated chassis
//!
//! A kinematic model of the robot driving beside a straight wall. The chassis starts parallel to
//! the wall at a set distance from it. Wheel speed is proportional to the commanded power, each
//! wheel having its own scale so the model drifts unless the differential regulator corrects it.
//!
//! Encoder edges are generated into a set of [`PulseCounters`], so the controller reads the
//! simulation through the same [`PulseEncoders`] it would use on hardware.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use comms_if::eqpt::{MotorDirection, MotorOutput, RangeSensor, Side, Wheel, MAX_PWM};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{
    hw::{PulseCounters, PulseEncoders},
    range_sensor::mm_to_analog,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulated chassis.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Rate at which the physics thread integrates the model.
    ///
    /// Units: Hz
    pub physics_frequency_hz: f64,

    /// Wheel speed at full power.
    ///
    /// Units: millimeters/second
    pub max_wheel_speed_mm_s: f64,

    /// Scale applied to the speed of wheels A and B.
    pub wheel_speed_scale: [f64; 2],

    /// Distance between the wheels.
    ///
    /// Units: millimeters
    pub wheel_track_mm: f64,

    /// True resolution of the encoders.
    pub pulses_per_meter: f64,

    /// Side of the chassis the wall and the range sensor are on.
    pub wall_side: Side,

    /// Distance from the range sensor to the wall at the start.
    ///
    /// Units: millimeters
    pub wall_distance_mm: f64,
}

/// Position of the chassis relative to where it started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SimPose {
    /// Distance along the wall.
    ///
    /// Units: millimeters
    pub x_mm: f64,

    /// Distance towards the left of the starting heading.
    ///
    /// Units: millimeters
    pub y_mm: f64,

    /// Heading, anticlockwise positive.
    ///
    /// Units: radians
    pub heading_rad: f64,
}

/// The simulated chassis.
///
/// Dropping the chassis stops its physics thread.
pub struct SimChassis {
    model: Arc<Mutex<SimModel>>,
    counters: Arc<PulseCounters>,
    run: Arc<AtomicBool>,
    physics_jh: Option<JoinHandle<()>>,
}

/// Motor output of a [`SimChassis`].
pub struct SimMotors {
    model: Arc<Mutex<SimModel>>,
}

/// Range sensor of a [`SimChassis`].
pub struct SimRangeSensor {
    model: Arc<Mutex<SimModel>>,
}

struct SimModel {
    params: SimParams,

    /// Signed power of each wheel as a fraction of full power
    power: [f64; 2],

    /// Fractions of a pulse not yet counted
    pulse_remainder: [f64; 2],

    pose: SimPose,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            physics_frequency_hz: 200.0,
            max_wheel_speed_mm_s: 300.0,
            wheel_speed_scale: [1.0, 0.95],
            wheel_track_mm: 155.0,
            pulses_per_meter: 2000.0,
            wall_side: Side::Left,
            wall_distance_mm: 300.0,
        }
    }
}

impl SimChassis {
    /// Create a stopped chassis. The model only moves when [`SimChassis::advance`] is called.
    pub fn new(params: SimParams) -> Self {
        Self {
            model: Arc::new(Mutex::new(SimModel {
                params,
                power: [0.0; 2],
                pulse_remainder: [0.0; 2],
                pose: SimPose::default(),
            })),
            counters: Arc::new(PulseCounters::default()),
            run: Arc::new(AtomicBool::new(false)),
            physics_jh: None,
        }
    }

    /// Create a chassis whose model is advanced in real time by a background thread.
    pub fn spawn(params: SimParams) -> io::Result<Self> {
        let period = util::time::period_from_frequency(params.physics_frequency_hz)
            .unwrap_or_else(|| Duration::from_millis(5));

        let mut chassis = Self::new(params);

        let model = chassis.model.clone();
        let counters = chassis.counters.clone();
        let run = chassis.run.clone();
        run.store(true, Ordering::Relaxed);

        chassis.physics_jh = Some(
            thread::Builder::new()
                .name("sim".into())
                .spawn(move || physics_thread(model, counters, run, period))?,
        );

        debug!("Simulated chassis started");

        Ok(chassis)
    }

    /// Encoder feed for this chassis.
    pub fn encoders(&self) -> PulseEncoders {
        PulseEncoders::new(self.counters.clone())
    }

    pub fn motors(&self) -> SimMotors {
        SimMotors {
            model: self.model.clone(),
        }
    }

    pub fn range_sensor(&self) -> SimRangeSensor {
        SimRangeSensor {
            model: self.model.clone(),
        }
    }

    pub fn pose(&self) -> SimPose {
        lock(&self.model).pose
    }

    /// Advance the model by `dt_s` seconds at the current wheel powers.
    pub fn advance(&self, dt_s: f64) {
        lock(&self.model).integrate(&self.counters, dt_s);
    }
}

impl Drop for SimChassis {
    fn drop(&mut self) {
        self.run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.physics_jh.take() {
            jh.join().ok();
        }
    }
}

impl SimModel {
    fn integrate(&mut self, counters: &PulseCounters, dt_s: f64) {
        let mut speed = [0.0; 2];

        for wheel in &Wheel::BOTH {
            let i = *wheel as usize;
            speed[i] = self.power[i]
                * self.params.max_wheel_speed_mm_s
                * self.params.wheel_speed_scale[i];

            // Encoders count edges whichever way the wheel turns
            let pulses = speed[i].abs() * dt_s * self.params.pulses_per_meter / 1000.0
                + self.pulse_remainder[i];
            let whole = pulses.floor();
            self.pulse_remainder[i] = pulses - whole;
            counters.add_edges(*wheel, whole as u32);
        }

        // Wheel A is on the left
        let forward_mm_s = (speed[0] + speed[1]) / 2.0;
        let yaw_rate_rad_s = (speed[1] - speed[0]) / self.params.wheel_track_mm;

        self.pose.heading_rad += yaw_rate_rad_s * dt_s;
        self.pose.x_mm += forward_mm_s * self.pose.heading_rad.cos() * dt_s;
        self.pose.y_mm += forward_mm_s * self.pose.heading_rad.sin() * dt_s;
    }

    /// Perpendicular distance from the range sensor to the wall.
    fn wall_range_mm(&self) -> f64 {
        match self.params.wall_side {
            Side::Left => self.params.wall_distance_mm - self.pose.y_mm,
            Side::Right => self.params.wall_distance_mm + self.pose.y_mm,
        }
    }
}

impl MotorOutput for SimMotors {
    fn set_power(&mut self, wheel: Wheel, direction: MotorDirection, pwm: u16) {
        let fraction = pwm.min(MAX_PWM) as f64 / MAX_PWM as f64;

        lock(&self.model).power[wheel as usize] = match direction {
            MotorDirection::Forward => fraction,
            MotorDirection::Reverse => -fraction,
        };
    }

    fn stop(&mut self, wheel: Wheel) {
        lock(&self.model).power[wheel as usize] = 0.0;
    }
}

impl RangeSensor for SimRangeSensor {
    fn read_raw(&mut self) -> u16 {
        mm_to_analog(lock(&self.model).wall_range_mm())
    }
}

fn physics_thread(
    model: Arc<Mutex<SimModel>>,
    counters: Arc<PulseCounters>,
    run: Arc<AtomicBool>,
    period: Duration,
) {
    let mut last = Instant::now();

    while run.load(Ordering::Relaxed) {
        thread::sleep(period);

        let now = Instant::now();
        let mut model = lock(&model);
        model.integrate(&counters, (now - last).as_secs_f64());
        last = now;

        trace!("Sim pose: {:?}", model.pose);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
