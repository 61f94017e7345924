//! # Supervisory controller module
//!
//! The supervisor owns the vehicle's operating mode. Once per cycle it runs the failsafe monitor
//! and, if the vehicle is safe to drive, produces the cycle's velocity command from the source
//! belonging to the current mode:
//!
//! - `Sleep` and `Halt` always command zero.
//! - `ManualTeleop` and `ExternalCommand` map the requested velocity through a [`CmdMapper`].
//! - `AutonomousDock` steps the docking navigator with the fix for its current phase.
//!
//! If the failsafe monitor finds the vehicle unsafe the supervisor drops to `Halt` and stays
//! there until a new mode is requested.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd_map;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use cmd_map::*;
pub use params::*;
pub use state::*;

use comms_if::tc::mode::OperatingMode;
use thiserror::Error;
use util::{archive::ArchiveError, params::LoadError};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Reasons a mode request can be refused. A refused request never changes
/// the mode.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub enum ModeRejected {
    #[error("Cannot dock before a dock target has been configured")]
    NoDockTarget,

    #[error("Cannot enter {0} while the vehicle is not safe to drive")]
    Unsafe(OperatingMode),

    #[error("Cannot go from {from} to {to}")]
    InvalidTransition {
        from: OperatingMode,
        to: OperatingMode,
    },
}

/// Errors which can occur while initialising the supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Could not load the {0} parameters: {1}")]
    ParamLoadError(&'static str, LoadError),

    #[error("Could not create the supervisor archive: {0}")]
    ArchiveError(ArchiveError),
}
