//! # Telecommand processor module
//!
//! The telecommand processor handles various TCs coming from any source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};

// Internal
use comms_if::{
    eqpt::drive::VelocityCommand,
    tc::{mode::OperatingMode, Tc},
};
use veh_lib::data_store::DataStore;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Mutates the datastore to send commands to different modules. Rejected
/// mode requests are logged by the supervisor and are not fatal.
pub(crate) fn exec(ds: &mut DataStore, tc: &Tc) {
    let mode_request = match tc {
        Tc::Wake => match ds.supervisor.current_mode() {
            OperatingMode::Sleep => Some(OperatingMode::Halt),
            _ => {
                debug!("Wake received while awake, ignored");
                None
            }
        },
        Tc::Sleep => Some(OperatingMode::Sleep),
        Tc::Halt => Some(OperatingMode::Halt),
        Tc::Mode { mode } => Some(*mode),
        Tc::Drive {
            linear_ms,
            angular_rads,
        } => {
            ds.cmd = Some(VelocityCommand::new(*linear_ms, *angular_rads));
            None
        }
        Tc::Heartbeat => {
            ds.cmd = Some(VelocityCommand::zero());
            None
        }
        Tc::ConfigureDock { target, anchors } => {
            ds.supervisor
                .configure_dock_target(*target, anchors.clone());
            None
        }
        Tc::Switch { engaged } => {
            info!(
                "Safety interlock {}",
                if *engaged { "engaged" } else { "disengaged" }
            );
            ds.hardware_switch_engaged = *engaged;
            None
        }
    };

    if let Some(mode) = mode_request {
        if let Err(e) = ds.supervisor.request_mode(mode) {
            debug!("TC {:?} not executed: {}", tc, e);
        }
    }
}
