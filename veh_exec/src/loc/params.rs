//! Parameters structure for the localisation providers

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::loc::{AnchorSet, TargetLocation, NUM_BEACON_RECEIVERS};
use serde::Deserialize;
use std::f64::consts::{FRAC_PI_4, PI};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for all localisation providers.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct LocParams {
    /// Location of the dock, if known at startup. Can also be set by
    /// telecommand.
    pub target: Option<TargetLocation>,

    /// Ranging anchors around the dock, used along with `target`.
    pub anchors: AnchorSet,

    pub satellite: SatelliteParams,
    pub ranging: RangingParams,
    pub beacon: BeaconParams,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct SatelliteParams {
    /// Minimum number of satellites in a solution for it to be used.
    pub min_satellites: u8,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct RangingParams {
    /// Minimum number of known anchors which must respond for a position to
    /// be computed. Values below 3 are treated as 3.
    pub min_anchors: usize,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct BeaconParams {
    /// Bearing of the centre of each receiver's field of view relative to the
    /// vehicle's forward axis, positive to the left, indexed by
    /// `BeaconReceiver::index`.
    ///
    /// Units: radians
    pub receiver_bearing_rad: [f64; NUM_BEACON_RECEIVERS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SatelliteParams {
    fn default() -> Self {
        Self { min_satellites: 4 }
    }
}

impl Default for RangingParams {
    fn default() -> Self {
        Self { min_anchors: 3 }
    }
}

impl Default for BeaconParams {
    fn default() -> Self {
        Self {
            receiver_bearing_rad: [FRAC_PI_4, 0.0, -FRAC_PI_4, PI],
        }
    }
}
