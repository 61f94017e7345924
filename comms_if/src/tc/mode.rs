//! # Operating mode telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The top level operating modes of the vehicle.
///
/// Only one mode is active at any time. Modes are changed on request, except for `Halt` which the
/// supervisor may enter on its own whenever it is not safe to drive.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum OperatingMode {
    /// Low power mode, the main computer is off and only wake requests are accepted.
    Sleep,

    /// Normal powered mode with the drivetrain held at zero velocity.
    Halt,

    /// Driving from operator joystick commands.
    ManualTeleop,

    /// Driving from velocity commands issued by an external computer.
    ExternalCommand,

    /// Unattended homing into the charging dock.
    AutonomousDock,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl OperatingMode {
    /// Returns true if the mode is allowed to command a nonzero velocity.
    pub fn is_driving(&self) -> bool {
        match self {
            OperatingMode::Sleep | OperatingMode::Halt => false,
            OperatingMode::ManualTeleop
            | OperatingMode::ExternalCommand
            | OperatingMode::AutonomousDock => true,
        }
    }
}

impl Default for OperatingMode {
    fn default() -> Self {
        OperatingMode::Halt
    }
}

impl std::fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OperatingMode::Sleep => "SLEEP",
            OperatingMode::Halt => "HALT",
            OperatingMode::ManualTeleop => "MANUAL_TELEOP",
            OperatingMode::ExternalCommand => "EXTERNAL_COMMAND",
            OperatingMode::AutonomousDock => "AUTONOMOUS_DOCK",
        };
        write!(f, "{}", s)
    }
}
