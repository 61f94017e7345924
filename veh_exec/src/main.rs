//! Main vehicle-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Telecommand processing and handling
//!         - Sensor input acquisition (from the simulation)
//!         - Supervisor processing:
//!             - Failsafe evaluation
//!             - Mode dependent command generation, including docking
//!         - Drivetrain demands
//!         - Archiving
//!
//! # Modules
//!
//! All cyclic modules (e.g. `supervisor`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use veh_lib::{
    data_store::DataStore,
    drive_client::DiffDrive,
    params::VehExecParams,
    sim_client::{SimParams, SimVehicle},
    supervisor::SupervisorInitData,
};

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Script run when none is given on the command line.
const DEMO_SCRIPT: &str = include_str!("../../scripts/dock_demo.txt");

// ---------------------------------------------------------------------------
// STRUCTURES
// ---------------------------------------------------------------------------

/// Vehicle executable, drives the simulated vehicle from a telecommand script.
#[derive(Debug, StructOpt)]
#[structopt(name = "veh_exec")]
struct Opt {
    /// Telecommand script to execute. The built in docking demo is run if
    /// not given.
    #[structopt(short, long, parse(from_os_str))]
    script: Option<PathBuf>,

    /// Minimum level of log messages, `info` or more verbose.
    #[structopt(short, long, default_value = "info")]
    log_level: LevelFilter,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("veh_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opt.log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Vehicle Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let exec_params: VehExecParams =
        util::params::load("veh_exec.toml").wrap_err("Could not load exec params")?;
    exec_params.validate().wrap_err("Invalid exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE TC SOURCE ----

    let mut si = match opt.script {
        Some(ref path) => {
            info!("Loading script from {:?}", path);
            ScriptInterpreter::new(path).wrap_err("Failed to load script")?
        }
        None => {
            info!("No script provided, running the docking demo");
            ScriptInterpreter::from_script_str(DEMO_SCRIPT)
                .wrap_err("Failed to load the demo script")?
        }
    };

    info!(
        "Loaded script lasts {:.02} s and contains {} TCs\n",
        si.get_duration(),
        si.get_num_tcs()
    );

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.supervisor
        .init(
            SupervisorInitData {
                supervisor_params: "supervisor.toml",
                dock_nav_params: "dock_nav.toml",
                loc_params: "loc.toml",
            },
            &session,
        )
        .wrap_err("Failed to initialise the Supervisor")?;
    info!("Supervisor init complete");

    let mut drive_client = {
        let sim_params: SimParams =
            util::params::load("sim.toml").wrap_err("Could not load sim params")?;
        info!("SimVehicle initialised");
        DiffDrive::new(exec_params.drive, SimVehicle::new(sim_params, exec_params.drive))
    };

    drive_client
        .check_bounds(&ds.supervisor.command_bounds())
        .wrap_err("The command limits exceed what the drivetrain can do")?;

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let script_start_s = session::get_elapsed_seconds();
    let mut last_cycle_s = script_start_s;

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();
        let now_s = session::get_elapsed_seconds();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(exec_params.cycle_frequency_hz());

        // ---- TELECOMMAND PROCESSING ----

        match si.get_pending_tcs(now_s - script_start_s) {
            PendingTcs::None => (),
            PendingTcs::Some(tc_vec) => {
                for tc in tc_vec.iter() {
                    tc_processor::exec(&mut ds, tc);
                }
            }
            // Exit if end of script reached
            PendingTcs::EndOfScript => {
                info!("End of TC script reached, stopping");
                break;
            }
        }

        // ---- DATA INPUT ----

        drive_client.iface_mut().step(now_s - last_cycle_s);
        last_cycle_s = now_s;

        if let Some(dock) = ds.supervisor.dock().cloned() {
            let meas = drive_client.iface().measurements(&dock);
            for m in meas.iter() {
                ds.supervisor.loc_mgr_mut().set_measurement(m);
            }
        }

        // ---- SUPERVISOR PROCESSING ----

        let output = ds.supervisor_cycle(now_s);

        // ---- DRIVETRAIN ----

        let result = drive_client.send(&output);
        ds.drive_result(result, exec_params.max_drive_failures);

        // ---- WRITE ARCHIVES ----

        if exec_params.archive_enabled {
            if let Err(e) = ds.supervisor.write() {
                warn!("Could not write the supervisor archive: {}", e);
            }
        }

        // ---- TELEMETRY ----

        if ds.is_1_hz_cycle {
            let status = ds.supervisor.status();
            info!(
                "{} ({:?}), failsafe ok: {}, cmd: ({:.3} m/s, {:.3} rad/s)",
                status.mode,
                status.docking_phase,
                status.failsafe_ok,
                ds.output.linear_ms,
                ds.output.angular_rads
            );
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(exec_params.cycle_period_s).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - exec_params.cycle_period_s
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    ds.supervisor.make_safe();

    info!("End of execution");

    Ok(())
}
