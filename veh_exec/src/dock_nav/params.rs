//! Parameters structure for DockNav

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the docking navigator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DockNavParams {
    /// Satellite phase parameters.
    pub coarse: PhaseParams,

    /// Ranging phase parameters.
    pub medium: PhaseParams,

    /// Beacon phase parameters. The advance distance of this phase is the
    /// distance at which the vehicle is considered homed.
    pub fine: PhaseParams,

    /// In the beacon phase the vehicle only moves forward while the
    /// magnitude of the heading error is below this threshold.
    ///
    /// Units: radians
    pub align_threshold_rad: f64,

    /// What to command when the active source has no fix.
    pub lost_fix_policy: LostFixPolicy,
}

/// Advance threshold and proportional controller settings for one phase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PhaseParams {
    /// Distance at or below which the navigator moves on to the next phase.
    ///
    /// Units: meters
    pub advance_dist_m: f64,

    /// Linear speed proportional gain on distance.
    ///
    /// Units: 1/seconds
    pub k_linear: f64,

    /// Turn rate proportional gain on heading error.
    ///
    /// Units: 1/seconds
    pub k_angular: f64,

    /// Maximum magnitude of the linear speed demand.
    ///
    /// Units: meters/second
    pub max_linear_ms: f64,

    /// Maximum magnitude of the turn rate demand.
    ///
    /// Units: radians/second
    pub max_angular_rads: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Behaviour of the navigator on a cycle where the active source reports no
/// fix. The phase never changes on such a cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LostFixPolicy {
    /// Command zero velocity.
    Zero,

    /// Repeat the previous cycle's command, limited to the phase's bounds.
    HoldLast,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for DockNavParams {
    fn default() -> Self {
        Self {
            coarse: PhaseParams {
                advance_dist_m: 10.0,
                k_linear: 1.0,
                k_angular: 0.3,
                max_linear_ms: 0.4,
                max_angular_rads: 1.0,
            },
            medium: PhaseParams {
                advance_dist_m: 3.0,
                k_linear: 1.0,
                k_angular: 0.3,
                max_linear_ms: 0.4,
                max_angular_rads: 1.0,
            },
            fine: PhaseParams {
                advance_dist_m: 0.1,
                k_linear: 0.1,
                k_angular: 0.3,
                max_linear_ms: 0.25,
                max_angular_rads: 1.0,
            },
            align_threshold_rad: std::f64::consts::FRAC_PI_8,
            lost_fix_policy: LostFixPolicy::Zero,
        }
    }
}
