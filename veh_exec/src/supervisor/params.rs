//! Parameters structure for the Supervisor

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::failsafe::DEFAULT_WATCHDOG_TIMEOUT_S;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the supervisory controller.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct SupervisorParams {
    /// Maximum age of the last command before the vehicle is halted.
    ///
    /// Units: seconds
    pub watchdog_timeout_s: f64,

    /// Mapping of operator joystick commands.
    pub manual: CmdMapParams,

    /// Mapping of commands from the external computer.
    pub external: CmdMapParams,
}

/// Deadzone and saturation limits applied to one source of velocity
/// commands.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct CmdMapParams {
    /// Units: meters/second
    pub deadzone_linear_ms: f64,

    /// Units: radians/second
    pub deadzone_angular_rads: f64,

    /// Units: meters/second
    pub max_linear_ms: f64,

    /// Units: radians/second
    pub max_angular_rads: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SupervisorParams {
    fn default() -> Self {
        Self {
            watchdog_timeout_s: DEFAULT_WATCHDOG_TIMEOUT_S,
            manual: CmdMapParams {
                deadzone_linear_ms: 0.02,
                deadzone_angular_rads: 0.02,
                max_linear_ms: 1.0,
                max_angular_rads: 1.5,
            },
            external: CmdMapParams {
                deadzone_linear_ms: 0.0,
                deadzone_angular_rads: 0.0,
                max_linear_ms: 1.0,
                max_angular_rads: 1.5,
            },
        }
    }
}
