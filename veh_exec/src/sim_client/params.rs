//! Parameters structure for the simulated vehicle

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::loc::NUM_BEACON_RECEIVERS;
use serde::Deserialize;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the simulated vehicle and its sensors.
///
/// The simulation works in the dock frame, with X+ pointing east and Y+
/// pointing north.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimParams {
    /// Units: meters
    pub initial_position_m: [f64; 2],

    /// Heading anticlockwise from X+.
    ///
    /// Units: radians
    pub initial_heading_rad: f64,

    /// Number of satellites reported in every satellite solution.
    pub num_satellites: u8,

    /// Anchors further away than this don't respond.
    ///
    /// Units: meters
    pub ranging_max_range_m: f64,

    /// The beacon and short range sensor can't see the dock further away than
    /// this.
    ///
    /// Units: meters
    pub beacon_max_range_m: f64,

    /// Half width of each beacon receiver's field of view.
    ///
    /// Units: radians
    pub beacon_half_fov_rad: f64,

    /// Centre of each beacon receiver's field of view relative to the
    /// vehicle's forward axis.
    ///
    /// Units: radians
    pub beacon_receiver_bearing_rad: [f64; NUM_BEACON_RECEIVERS],
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            initial_position_m: [0.5, 15.0],
            initial_heading_rad: -FRAC_PI_2,
            num_satellites: 9,
            ranging_max_range_m: 30.0,
            beacon_max_range_m: 4.0,
            beacon_half_fov_rad: 0.6,
            beacon_receiver_bearing_rad: [FRAC_PI_4, 0.0, -FRAC_PI_4, PI],
        }
    }
}
