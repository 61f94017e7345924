//! # Drivetrain Equipment Commands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A body velocity command, the unit of communication between the command handlers (manual,
/// external or docking) and the drivetrain.
///
/// Commands must already be clamped to the active mode's limits, the drivetrain applies no
/// further limiting.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct VelocityCommand {
    /// Forward speed of the vehicle body.
    ///
    /// Units: meters/second
    pub linear_ms: f64,

    /// Turn rate of the vehicle body, positive turns to the left.
    ///
    /// Units: radians/second
    pub angular_rads: f64,
}

/// Demands that are sent to the drivetrain
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DriveDems {
    /// The demanded speed of each drive actuator.
    ///
    /// Units: radians/second
    pub speed_rads: HashMap<ActId, f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of all drive actuators available to the vehicle
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum ActId {
    DrvLeft,
    DrvRight,
}

/// Response from the drivetrain based on the demands sent to it.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
pub enum DriveDemsResponse {
    /// Demands were valid and will be executed
    DemsOk,

    /// Demands were invalid and have been rejected
    DemsInvalid,

    /// Equipment is invalid so demands cannot be actuated
    EqptInvalid,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VelocityCommand {
    /// Create a new command.
    pub fn new(linear_ms: f64, angular_rads: f64) -> Self {
        Self {
            linear_ms,
            angular_rads,
        }
    }

    /// The zero command, which holds the vehicle stationary.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Returns true if both components of the command are exactly zero.
    pub fn is_zero(&self) -> bool {
        self.linear_ms == 0.0 && self.angular_rads == 0.0
    }
}

impl ActId {
    /// Human readable label of the actuator, for logging only.
    pub fn label(&self) -> &'static str {
        match self {
            ActId::DrvLeft => "Left drive motor",
            ActId::DrvRight => "Right drive motor",
        }
    }
}

impl Default for DriveDems {
    fn default() -> Self {
        let mut speed_rads = HashMap::new();

        speed_rads.insert(ActId::DrvLeft, 0.0);
        speed_rads.insert(ActId::DrvRight, 0.0);

        Self { speed_rads }
    }
}
