//! Main drive executable entry point.
//!
//! # Architecture
//!
//! The executable runs a TC script against the simulated chassis:
//!
//!     - Initialise the session, logging and parameters
//!     - Start the simulated chassis and the motion controller
//!     - Main loop:
//!         - Telecommand processing, motion commands are handed to the motion worker
//!         - Collection and archiving of the reports of finished motion commands
//!     - Exit once the script has ended and no motion command is running

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod motion_worker;
mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use serde::Serialize;
use std::{
    env,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

// Internal
use comms_if::tc::motion_ctrl::MotionCmd;
use drive_lib::{
    motion_ctrl::{self, MotionCtrl, MotionReport},
    sim::{SimChassis, SimParams, SimPose},
};
use motion_worker::MotionWorker;
use util::{
    logger::{logger_init, LevelFilter},
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.10;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Archived record of a finished motion command.
#[derive(Serialize)]
struct MotionRecord {
    cmd: MotionCmd,
    report: MotionReport,
    pose: SimPose,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    // Initialise session
    let session = Session::new("drive_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Differential Drive Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let motion_params: motion_ctrl::Params =
        util::params::load("motion_ctrl.toml").wrap_err("Could not load motion_ctrl params")?;
    let sim_params: SimParams =
        util::params::load("sim.toml").wrap_err("Could not load sim params")?;

    info!("Exec parameters loaded");

    // ---- LOAD SCRIPT ----

    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    if args.len() != 2 {
        return Err(eyre!(
            "Expected a single argument, the path to a TC script, found {} arguments",
            args.len() - 1
        ));
    }

    info!("Loading script from \"{}\"", &args[1]);

    let mut script = ScriptInterpreter::new(&args[1]).wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} TCs\n",
        script.get_duration(),
        script.get_num_tcs()
    );

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let chassis = SimChassis::spawn(sim_params).wrap_err("Failed to start the simulated chassis")?;
    info!("Simulated chassis initialised");

    let ctrl = Arc::new(
        MotionCtrl::new(motion_params, chassis.encoders(), chassis.motors())
            .wrap_err("Failed to initialise MotionCtrl")?,
    );
    info!("MotionCtrl init complete");

    let mut worker = MotionWorker::spawn(ctrl.clone(), chassis.range_sensor())
        .wrap_err("Failed to start the motion worker")?;
    info!("Motion worker started");

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let cycle_period = Duration::from_secs_f64(CYCLE_PERIOD_S);
    let mut end_of_script = false;

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- TELECOMMAND PROCESSING ----

        if !end_of_script {
            match script.get_pending_tcs(session::get_elapsed_seconds()) {
                PendingTcs::None => (),
                PendingTcs::Some(tc_vec) => {
                    for tc in tc_vec.iter() {
                        tc_processor::exec(tc, &ctrl, &mut worker);
                    }
                }
                PendingTcs::EndOfScript => {
                    info!("End of TC script reached");
                    end_of_script = true;
                }
            }
        }

        // ---- MOTION REPORTS ----

        for (cmd, report) in worker.reports() {
            info!(
                "{:?} finished: {:?} after {} ticks",
                cmd, report.outcome, report.ticks
            );

            session::save_with_timestamp(
                "motion/report.json",
                MotionRecord {
                    cmd,
                    report,
                    pose: chassis.pose(),
                },
            );
        }

        if end_of_script && !worker.is_busy() {
            info!("No motion command running, stopping");
            break;
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
            ),
        }
    }

    // ---- SHUTDOWN ----

    if worker.stop().is_err() {
        warn!("Motion worker panicked");
    }

    info!("Final pose: {:?}", chassis.pose());

    session.exit();

    info!("End of execution");

    Ok(())
}
