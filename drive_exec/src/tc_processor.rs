//! # Telecommand processor module
//!
//! The telecommand processor handles TCs coming from any source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};

// Internal
use crate::motion_worker::MotionWorker;
use comms_if::{
    eqpt::{EncoderFeed, MotorOutput},
    tc::Tc,
};
use drive_lib::motion_ctrl::MotionCtrl;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Motion commands are handed to the worker, everything else acts on the controller directly.
pub(crate) fn exec<E, M>(tc: &Tc, ctrl: &MotionCtrl<E, M>, worker: &mut MotionWorker)
where
    E: EncoderFeed,
    M: MotorOutput,
{
    match tc {
        Tc::Motion(cmd) => {
            if worker.request(*cmd) {
                info!("Executing {:?}", cmd);
            }
        }
        Tc::Abort => {
            debug!("Received Abort command");
            ctrl.abort();
        }
        Tc::SetGains { p, i, d } => {
            debug!("Received SetGains command");
            ctrl.set_gains(*p, *i, *d);
        }
    }
}
