//! Driving forward until the range sensor sees an obstacle

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    panic,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, RecvTimeoutError},
    },
    thread,
};

use comms_if::eqpt::{EncoderFeed, MotorDirection, MotorOutput, RangeSensor};
use log::{debug, info};

use super::{
    DiscardReason, DriveDemand, MotionCtrl, MotionGoal, MotionReport, Regulator, Tick,
    WheelDistances,
};
use crate::range_sensor::{read_range_mm, threshold_to_mm};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Wraps a regulator so that the command finishes on the first tick after `halt` is set.
struct Halting<'h, R> {
    inner: R,
    halt: &'h AtomicBool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<'h, R: Regulator> Regulator for Halting<'h, R> {
    fn tick(&mut self, distances: WheelDistances) -> Tick {
        if self.halt.load(Ordering::Acquire) {
            Tick {
                demand: DriveDemand {
                    power_a: 0.0,
                    power_b: 0.0,
                    dir_a: MotorDirection::Forward,
                    dir_b: MotorDirection::Forward,
                },
                done: true,
            }
        } else {
            self.inner.tick(distances)
        }
    }
}

impl<E, M> MotionCtrl<E, M>
where
    E: EncoderFeed + Send,
    M: MotorOutput + Send,
{
    /// Drive forward until `sensor` reads `distance_cm` or less.
    ///
    /// The threshold is clamped into the sensor's range. A non-finite threshold could never be
    /// reached, so the command is discarded.
    ///
    /// The drive runs on its own thread while this thread polls the sensor once per control
    /// period. Reaching the threshold completes the command. If the drive ends first, because it
    /// was aborted or reached its unbounded goal, polling stops and its report is returned.
    pub fn forward_until<S: RangeSensor>(&self, distance_cm: f64, sensor: &mut S) -> MotionReport {
        const LABEL: &str = "Forward until";

        if !distance_cm.is_finite() {
            debug!("{} discarded, threshold of {} cm", LABEL, distance_cm);
            return MotionReport::discarded(DiscardReason::ZeroGoal);
        }

        let threshold_mm = threshold_to_mm(distance_cm);
        let goal = MotionGoal {
            goal_mm: self.params().unbounded_goal_mm,
            dir_a: MotorDirection::Forward,
            dir_b: MotorDirection::Forward,
        };

        let (token, regulator) = match self.prepare_distance_cmd(goal, LABEL) {
            Ok(c) => c,
            Err(reason) => return MotionReport::discarded(reason),
        };

        info!("{} the range falls to {:.1} mm", LABEL, threshold_mm);

        let halt = AtomicBool::new(false);
        let period = self.period();

        thread::scope(|s| {
            let halt = &halt;
            let (done_tx, done_rx) = mpsc::channel();

            let drive = s.spawn(move || {
                let report = self.run(
                    token,
                    Halting {
                        inner: regulator,
                        halt,
                    },
                    LABEL,
                );
                done_tx.send(()).ok();
                report
            });

            loop {
                match done_rx.recv_timeout(period) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => (),
                }

                let range_mm = read_range_mm(&mut *sensor);
                if range_mm <= threshold_mm {
                    info!("{} reached range of {:.1} mm", LABEL, range_mm);
                    halt.store(true, Ordering::Release);

                    // Wait for the drive to stop, an error means it panicked and join reports it
                    done_rx.recv().ok();
                    break;
                }
            }

            match drive.join() {
                Ok(report) => report,
                Err(payload) => panic::resume_unwind(payload),
            }
        })
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
