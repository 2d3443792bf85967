//! # Motion worker
//!
//! Motion commands block until they finish, so they are executed on a worker thread while the
//! main loop keeps processing TCs (in particular aborts).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    io,
    sync::{
        mpsc::{channel, Receiver, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
};

use comms_if::{
    eqpt::{EncoderFeed, MotorOutput, RangeSensor},
    tc::motion_ctrl::MotionCmd,
};
use drive_lib::motion_ctrl::{MotionCtrl, MotionReport};
use log::debug;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Handle to the motion worker thread.
pub struct MotionWorker {
    cmd_tx: Sender<MotionCmd>,
    report_rx: Receiver<(MotionCmd, MotionReport)>,
    jh: JoinHandle<()>,

    /// True between a command being sent and its report being received
    in_flight: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotionWorker {
    /// Start a worker executing commands on `ctrl`, using `sensor` for the commands that need a
    /// range.
    pub fn spawn<E, M, S>(ctrl: Arc<MotionCtrl<E, M>>, mut sensor: S) -> io::Result<Self>
    where
        E: EncoderFeed + Send + 'static,
        M: MotorOutput + Send + 'static,
        S: RangeSensor + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = channel::<MotionCmd>();
        let (report_tx, report_rx) = channel();

        let jh = thread::Builder::new()
            .name("motion".into())
            .spawn(move || {
                // Runs until the handle drops the command sender
                while let Ok(cmd) = cmd_rx.recv() {
                    let report = ctrl.exec(cmd, &mut sensor);

                    if report_tx.send((cmd, report)).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            cmd_tx,
            report_rx,
            jh,
            in_flight: false,
        })
    }

    /// True while a command sent to the worker has not reported.
    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Send `cmd` to the worker.
    ///
    /// Commands are not queued: if the worker is busy the command is discarded and `false` is
    /// returned.
    pub fn request(&mut self, cmd: MotionCmd) -> bool {
        if self.in_flight {
            debug!("{:?} discarded, a motion command is already running", cmd);
            return false;
        }

        match self.cmd_tx.send(cmd) {
            Ok(()) => {
                self.in_flight = true;
                true
            }
            Err(_) => {
                debug!("{:?} discarded, the motion worker has stopped", cmd);
                false
            }
        }
    }

    /// Collect the reports of finished commands.
    pub fn reports(&mut self) -> Vec<(MotionCmd, MotionReport)> {
        let reports: Vec<_> = self.report_rx.try_iter().collect();

        if !reports.is_empty() {
            self.in_flight = false;
        }

        reports
    }

    /// Stop the worker once its current command has finished.
    pub fn stop(self) -> thread::Result<()> {
        drop(self.cmd_tx);
        self.jh.join()
    }
}
