//! Motion controller state and command supervision

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    thread,
    time::{Duration, Instant},
};

use comms_if::eqpt::{EncoderFeed, MotorDirection, MotorOutput, Wheel};
use log::{debug, info, warn};
use util::time::period_from_frequency;

use super::{
    run_token::CommandFlag, ControllerGains, DiscardReason, DistanceRegulator, MotionCtrlError,
    MotionGoal, MotionOutcome, MotionReport, Params, Regulator, WheelDistances,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Motion controller.
///
/// Owns the encoders and motors of the chassis and runs at most one motion command on them at a
/// time. All commands block the calling thread until they finish. The controller is `Sync`, so
/// another thread holding a reference (or an `Arc`) can [`MotionCtrl::abort`] a running command.
pub struct MotionCtrl<E, M> {
    params: Params,

    /// Period of the control loop
    period: Duration,

    /// Gains used by the next command to start
    gains: Mutex<ControllerGains>,

    flag: CommandFlag,

    encoders: Mutex<E>,

    motors: Mutex<M>,
}

/// Proof that a command owns the drive.
///
/// Dropping the token stops both wheels and then releases the drive, whichever way the command
/// ends.
pub(crate) struct CommandToken<'a, E, M: MotorOutput> {
    ctrl: &'a MotionCtrl<E, M>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<E, M> MotionCtrl<E, M>
where
    E: EncoderFeed,
    M: MotorOutput,
{
    /// Create a new controller driving `motors` with feedback from `encoders`.
    pub fn new(params: Params, encoders: E, motors: M) -> Result<Self, MotionCtrlError> {
        let period = period_from_frequency(params.loop_frequency_hz)
            .ok_or(MotionCtrlError::InvalidLoopFrequency(params.loop_frequency_hz))?;

        if !(params.integral_limit >= 0.0) {
            return Err(MotionCtrlError::InvalidParam(
                "integral_limit",
                params.integral_limit,
            ));
        }
        if !(params.turn_circumference_mm > 0.0) {
            return Err(MotionCtrlError::InvalidParam(
                "turn_circumference_mm",
                params.turn_circumference_mm,
            ));
        }
        if !(params.unbounded_goal_mm > 0.0) {
            return Err(MotionCtrlError::InvalidParam(
                "unbounded_goal_mm",
                params.unbounded_goal_mm,
            ));
        }
        if params.wall_follow.error_divisor == 0.0 {
            return Err(MotionCtrlError::InvalidParam(
                "wall_follow.error_divisor",
                params.wall_follow.error_divisor,
            ));
        }

        Ok(Self {
            gains: Mutex::new(params.gains),
            params,
            period,
            flag: CommandFlag::default(),
            encoders: Mutex::new(encoders),
            motors: Mutex::new(motors),
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Drive both wheels `goal_mm` in the given directions.
    ///
    /// Blocks until the goal is reached or the command is aborted. The command is discarded if
    /// the goal is zero or another command is running.
    pub fn start(
        &self,
        goal_mm: f64,
        dir_a: MotorDirection,
        dir_b: MotorDirection,
    ) -> MotionReport {
        self.start_goal(
            MotionGoal {
                goal_mm,
                dir_a,
                dir_b,
            },
            "Start",
        )
    }

    /// Drive forward `distance_cm`, or backward if the distance is negative.
    pub fn forward(&self, distance_cm: f64) -> MotionReport {
        self.start_goal(MotionGoal::straight(distance_cm), "Forward")
    }

    /// Drive backward `distance_cm`.
    pub fn backward(&self, distance_cm: f64) -> MotionReport {
        self.forward(-distance_cm)
    }

    /// Turn on the spot `angle_deg` clockwise, or anticlockwise if the angle is negative.
    pub fn turn_right(&self, angle_deg: f64) -> MotionReport {
        self.start_goal(
            MotionGoal::point_turn(angle_deg, self.params.turn_circumference_mm),
            "Turn",
        )
    }

    /// Turn on the spot `angle_deg` anticlockwise.
    pub fn turn_left(&self, angle_deg: f64) -> MotionReport {
        self.turn_right(-angle_deg)
    }

    /// Stop the running command.
    ///
    /// The command observes the request at the end of its current tick. Does nothing if no
    /// command is running. A command started after the abort waits for the aborted one to stop
    /// the wheels before taking the drive.
    pub fn abort(&self) {
        if self.flag.cancel() {
            info!("Abort requested");
        } else {
            debug!("Abort requested with no command running");
        }
    }

    pub fn is_running(&self) -> bool {
        self.flag.is_running()
    }

    /// Gains the next command will use.
    pub fn gains(&self) -> ControllerGains {
        *lock(&self.gains)
    }

    /// Replace the distance regulator gains, keeping the differential gain.
    ///
    /// A running command keeps the gains it started with.
    pub fn set_gains(&self, p: f64, i: f64, d: f64) {
        let mut gains = lock(&self.gains);
        gains.p = p;
        gains.i = i;
        gains.d = d;

        info!("Gains set to P: {}, I: {}, D: {}", p, i, d);
        if self.flag.is_owned() {
            debug!("New gains apply from the next command");
        }
    }

    /// Replace all gains.
    pub fn set_controller_gains(&self, gains: ControllerGains) {
        *lock(&self.gains) = gains;
        info!("Controller gains set to {:?}", gains);
    }

    /// Run `f` with exclusive access to the encoders and motors.
    ///
    /// Blocks a running command until `f` returns.
    pub fn with_hardware<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut E, &mut M) -> R,
    {
        let mut encoders = lock(&self.encoders);
        let mut motors = lock(&self.motors);
        f(&mut *encoders, &mut *motors)
    }

    pub(crate) fn period(&self) -> Duration {
        self.period
    }

    pub(crate) fn cancel(&self) -> bool {
        self.flag.cancel()
    }

    /// Take ownership of the drive, or log why the command named `label` can't start.
    pub(crate) fn acquire(&self, label: &str) -> Result<CommandToken<'_, E, M>, DiscardReason> {
        if self.flag.try_acquire() {
            Ok(CommandToken { ctrl: self })
        } else {
            debug!("{} discarded, a motion command is already running", label);
            Err(DiscardReason::AlreadyRunning)
        }
    }

    pub(crate) fn reset_encoders(&self) {
        lock(&self.encoders).reset_counters();
    }

    /// Validate `goal`, take the drive and build the regulator for a distance command.
    pub(crate) fn prepare_distance_cmd(
        &self,
        goal: MotionGoal,
        label: &str,
    ) -> Result<(CommandToken<'_, E, M>, DistanceRegulator), DiscardReason> {
        if !goal.is_valid() {
            debug!("{} discarded, goal of {} mm", label, goal.goal_mm);
            return Err(DiscardReason::ZeroGoal);
        }

        // Snapshot before taking the drive so a command seen running has its gains fixed
        let gains = self.gains();

        let token = self.acquire(label)?;
        self.reset_encoders();

        info!(
            "{} started: {:.1} mm, A {:?}, B {:?}",
            label, goal.goal_mm, goal.dir_a, goal.dir_b
        );

        Ok((token, DistanceRegulator::new(goal, gains, &self.params)))
    }

    fn start_goal(&self, goal: MotionGoal, label: &str) -> MotionReport {
        match self.prepare_distance_cmd(goal, label) {
            Ok((token, regulator)) => self.run(token, regulator, label),
            Err(reason) => MotionReport::discarded(reason),
        }
    }

    /// Run the control loop of an owned command until it is done or cancelled.
    pub(crate) fn run<R: Regulator>(
        &self,
        token: CommandToken<'_, E, M>,
        mut regulator: R,
        label: &str,
    ) -> MotionReport {
        let mut ticks = 0u32;
        let mut distances;

        let outcome = loop {
            let cycle_start = Instant::now();

            distances = WheelDistances::read(&mut *lock(&self.encoders));

            let tick = regulator.tick(distances);

            tick.demand.apply(&mut *lock(&self.motors));
            ticks += 1;

            let cycle_dur = Instant::now() - cycle_start;
            match self.period.checked_sub(cycle_dur) {
                Some(d) => thread::sleep(d),
                None => warn!(
                    "{} tick overran by {:.06} s",
                    label,
                    cycle_dur.as_secs_f64() - self.period.as_secs_f64()
                ),
            }

            if tick.done {
                break MotionOutcome::Completed;
            }
            if self.flag.is_cancelled() {
                break MotionOutcome::Aborted;
            }
        };

        // Stop the wheels and free the drive before reporting
        drop(token);

        info!(
            "{} {:?} after {} ticks, A: {:.1} mm, B: {:.1} mm",
            label, outcome, ticks, distances.a_mm, distances.b_mm
        );

        MotionReport {
            outcome,
            ticks,
            distances,
        }
    }
}

impl<'a, E, M: MotorOutput> Drop for CommandToken<'a, E, M> {
    fn drop(&mut self) {
        {
            let mut motors = lock(&self.ctrl.motors);
            for wheel in &Wheel::BOTH {
                motors.stop(*wheel);
            }
        }

        self.ctrl.flag.release();
    }
}

/// Lock a mutex, carrying on with the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_eqpt::{fast_params, MotorCall, RecordingMotors, StepEncoders};

    fn ctrl(step_mm: f64) -> MotionCtrl<StepEncoders, RecordingMotors> {
        MotionCtrl::new(
            fast_params(),
            StepEncoders::new(step_mm),
            RecordingMotors::default(),
        )
        .unwrap()
    }

    fn wait_until_running<E: EncoderFeed, M: MotorOutput>(ctrl: &MotionCtrl<E, M>) {
        while !ctrl.is_running() {
            thread::yield_now();
        }
    }

    #[test]
    fn test_invalid_params() {
        let mut params = fast_params();
        params.loop_frequency_hz = 0.0;
        assert!(matches!(
            MotionCtrl::new(params, StepEncoders::new(1.0), RecordingMotors::default()),
            Err(MotionCtrlError::InvalidLoopFrequency(_))
        ));

        let mut params = fast_params();
        params.integral_limit = -1.0;
        assert!(matches!(
            MotionCtrl::new(params, StepEncoders::new(1.0), RecordingMotors::default()),
            Err(MotionCtrlError::InvalidParam("integral_limit", _))
        ));
    }

    #[test]
    fn test_forward_end_to_end() {
        let ctrl = ctrl(5.0);

        let report = ctrl.forward(25.0);

        assert_eq!(report.outcome, MotionOutcome::Completed);
        assert!(report.ticks <= 50);
        assert!(report.distances.a_mm >= 250.0);
        assert!(report.distances.b_mm >= 250.0);
        assert!(!ctrl.is_running());

        ctrl.with_hardware(|encoders, motors| {
            assert_eq!(encoders.resets, 1);
            assert!(!motors.power_calls().is_empty());
            assert!(motors
                .power_calls()
                .iter()
                .all(|c| matches!(c, MotorCall::Power(_, MotorDirection::Forward, _))));

            let n = motors.calls.len();
            assert_eq!(
                &motors.calls[n - 2..],
                &[MotorCall::Stop(Wheel::A), MotorCall::Stop(Wheel::B)]
            );
        });
    }

    #[test]
    fn test_convergence_tick_count() {
        // 100 mm at 7 mm per tick takes ceil(100 / 7) ticks
        let ctrl = ctrl(7.0);
        let report = ctrl.start(100.0, MotorDirection::Forward, MotorDirection::Forward);

        assert_eq!(report.outcome, MotionOutcome::Completed);
        assert_eq!(report.ticks, 15);
        assert_eq!(report.distances.a_mm, 105.0);
        assert_eq!(report.distances.b_mm, 105.0);

        // One pair of power calls per tick
        ctrl.with_hardware(|_, motors| assert_eq!(motors.power_calls().len(), 30));
    }

    #[test]
    fn test_zero_goal_discarded() {
        let ctrl = ctrl(5.0);

        assert_eq!(
            ctrl.forward(0.0).outcome,
            MotionOutcome::Discarded(DiscardReason::ZeroGoal)
        );
        assert_eq!(
            ctrl.turn_right(0.0).outcome,
            MotionOutcome::Discarded(DiscardReason::ZeroGoal)
        );

        // Nothing reached the hardware
        ctrl.with_hardware(|encoders, motors| {
            assert_eq!(encoders.resets, 0);
            assert!(motors.calls.is_empty());
        });
    }

    #[test]
    fn test_derived_directions() {
        let ctrl = ctrl(5.0);

        let report = ctrl.backward(10.0);
        assert_eq!(report.outcome, MotionOutcome::Completed);
        assert_eq!(report.ticks, 20);
        ctrl.with_hardware(|_, motors| {
            assert_eq!(
                motors.first_directions(),
                Some((MotorDirection::Reverse, MotorDirection::Reverse))
            );
            motors.calls.clear();
        });

        // 90 degrees over a 487 mm circumference is 121.75 mm per wheel
        let report = ctrl.turn_left(90.0);
        assert_eq!(report.outcome, MotionOutcome::Completed);
        assert_eq!(report.ticks, 25);
        ctrl.with_hardware(|_, motors| {
            assert_eq!(
                motors.first_directions(),
                Some((MotorDirection::Reverse, MotorDirection::Forward))
            );
            motors.calls.clear();
        });

        ctrl.turn_right(90.0);
        ctrl.with_hardware(|_, motors| {
            assert_eq!(
                motors.first_directions(),
                Some((MotorDirection::Forward, MotorDirection::Reverse))
            );
        });
    }

    #[test]
    fn test_exclusivity_and_abort() {
        let ctrl = ctrl(1.0);

        // Aborting while idle does nothing
        ctrl.abort();
        assert!(!ctrl.is_running());

        thread::scope(|s| {
            let long = s.spawn(|| ctrl.forward(10_000.0));

            wait_until_running(&ctrl);

            let start = Instant::now();
            let second = ctrl.forward(10.0);
            assert_eq!(
                second.outcome,
                MotionOutcome::Discarded(DiscardReason::AlreadyRunning)
            );
            assert_eq!(second.ticks, 0);
            assert!(start.elapsed() < Duration::from_millis(100));
            assert!(ctrl.is_running());

            ctrl.abort();
            assert!(!ctrl.is_running());
            ctrl.abort();

            let report = long.join().unwrap();
            assert_eq!(report.outcome, MotionOutcome::Aborted);
            assert!(report.ticks > 0);
            assert!(report.distances.a_mm < 100_000.0);
        });

        assert!(!ctrl.is_running());
        ctrl.with_hardware(|_, motors| {
            let n = motors.calls.len();
            assert_eq!(
                &motors.calls[n - 2..],
                &[MotorCall::Stop(Wheel::A), MotorCall::Stop(Wheel::B)]
            );
        });

        // The drive is free again
        assert_eq!(ctrl.forward(1.0).outcome, MotionOutcome::Completed);
    }

    #[test]
    fn test_start_straight_after_abort() {
        // Slow loop so the aborted command is still on its last tick when the next one starts
        let ctrl = MotionCtrl::new(
            Params {
                loop_frequency_hz: 10.0,
                ..Params::default()
            },
            StepEncoders::new(5.0),
            RecordingMotors::default(),
        )
        .unwrap();

        thread::scope(|s| {
            let long = s.spawn(|| ctrl.forward(10_000.0));

            wait_until_running(&ctrl);
            ctrl.abort();
            assert!(!ctrl.is_running());

            let next = ctrl.forward(1.0);
            assert_eq!(next.outcome, MotionOutcome::Completed);
            assert_eq!(next.ticks, 2);

            assert_eq!(long.join().unwrap().outcome, MotionOutcome::Aborted);
        });

        assert!(!ctrl.is_running());
    }

    #[test]
    fn test_gains_snapshot() {
        let ctrl = ctrl(1.0);
        let defaults = ctrl.gains();

        thread::scope(|s| {
            let long = s.spawn(|| ctrl.forward(10_000.0));

            wait_until_running(&ctrl);
            ctrl.set_gains(0.0, 0.0, 0.0);
            thread::sleep(Duration::from_millis(10));
            ctrl.abort();

            assert_eq!(long.join().unwrap().outcome, MotionOutcome::Aborted);
        });

        // The running command kept driving with its initial gains
        ctrl.with_hardware(|_, motors| {
            assert!(motors
                .power_calls()
                .iter()
                .all(|c| matches!(c, MotorCall::Power(_, _, pwm) if *pwm > 0)));
            motors.calls.clear();
        });

        let gains = ctrl.gains();
        assert_eq!(gains.p, 0.0);
        assert_eq!(gains.p_diff, defaults.p_diff);

        // The next command uses the new gains
        assert_eq!(ctrl.forward(1.0).outcome, MotionOutcome::Completed);
        ctrl.with_hardware(|_, motors| {
            assert!(motors
                .power_calls()
                .iter()
                .all(|c| matches!(c, MotorCall::Power(_, _, 0))));
        });

        ctrl.set_controller_gains(defaults);
        assert_eq!(ctrl.gains(), defaults);
    }
}
