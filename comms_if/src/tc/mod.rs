//! # Telecommand module
//!
//! This module provides the telecommands accepted by the vehicle executable, whether they come
//! from a script or from an operator.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod mode;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Internal
use crate::eqpt::loc::{AnchorSet, TargetLocation};
use mode::OperatingMode;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the vehicle.
///
/// Telecommands are encoded as JSON objects tagged by their `type`, for example
/// `{"type": "Drive", "linear_ms": 0.3, "angular_rads": 0.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Tc {
    /// Wake the vehicle from `Sleep` into `Halt`.
    Wake,

    /// Put the vehicle into `Sleep`, only accepted from `Halt`.
    Sleep,

    /// Halt the vehicle immediately.
    Halt,

    /// Request a change of operating mode.
    Mode { mode: OperatingMode },

    /// A velocity command from the active command source.
    Drive { linear_ms: f64, angular_rads: f64 },

    /// A command carrying no motion, used to keep the watchdog fed.
    Heartbeat,

    /// Configure the dock target and ranging anchors.
    ConfigureDock {
        target: TargetLocation,
        anchors: AnchorSet,
    },

    /// Set the state of the safety interlock switch. Only meaningful when the interlock is
    /// simulated.
    Switch { engaged: bool },
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)
    }
}
