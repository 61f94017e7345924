//! # Localisation Equipment Data
//!
//! Fixes produced by the localisation providers, the dock configuration they are computed
//! against, and the raw (already decoded) measurements they are computed from.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single cycle's positioning result relative to the dock.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct LocalizationFix {
    /// False if the provider could not compute a fix this cycle.
    pub valid: bool,

    /// Distance from the vehicle to the dock.
    ///
    /// Units: meters
    pub distance_to_target_m: f64,

    /// Angle the vehicle must turn through to face the dock, positive to the left, in the range
    /// [-pi, pi].
    ///
    /// Units: radians
    pub heading_error_rad: f64,
}

/// Global location of the dock, used by the satellite provider.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct TargetLocation {
    /// Units: degrees
    pub latitude_deg: f64,

    /// Units: degrees
    pub longitude_deg: f64,
}

/// A ranging anchor installed around the dock.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Anchor {
    /// Network ID of the anchor's radio.
    pub network_id: u16,

    /// Position of the anchor in the dock frame (origin at the dock, X+ right, Y+ out of the
    /// dock mouth).
    ///
    /// Units: meters
    pub position_m: [f64; 2],
}

/// The set of ranging anchors around the dock.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AnchorSet {
    pub anchors: Vec<Anchor>,
}

/// Latest decoded output of the satellite positioning receiver.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct SatelliteMeasurement {
    /// Units: degrees
    pub latitude_deg: f64,

    /// Units: degrees
    pub longitude_deg: f64,

    /// Course over ground, clockwise from north.
    ///
    /// Units: radians
    pub course_rad: f64,

    /// Number of satellites used in the solution.
    pub num_satellites: u8,
}

/// Latest decoded output of the ranging tag.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct RangingMeasurement {
    /// Measured range to each anchor which responded, keyed by anchor network ID.
    ///
    /// Units: meters
    pub ranges_m: HashMap<u16, f64>,

    /// Heading of the vehicle in the dock frame, anticlockwise from the X+ axis.
    ///
    /// Units: radians
    pub heading_rad: f64,
}

/// Latest decoded output of the infrared beacon receivers.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct BeaconMeasurement {
    /// Whether each receiver currently sees the dock beacon, indexed by [`BeaconReceiver`].
    pub seen: [bool; NUM_BEACON_RECEIVERS],

    /// Range to the dock from the short range sensor, if one is available.
    ///
    /// Units: meters
    pub range_m: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of infrared beacon receivers fitted to the vehicle.
pub const NUM_BEACON_RECEIVERS: usize = 4;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The sensing modalities able to produce a [`LocalizationFix`].
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LocSource {
    /// Satellite positioning, long range and coarse.
    Satellite,

    /// Ultra-wideband ranging to anchors around the dock.
    Ranging,

    /// Infrared beacon on the dock, short range and fine.
    Beacon,
}

/// A raw measurement from any of the localisation sensors.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Measurement {
    Satellite(SatelliteMeasurement),
    Ranging(RangingMeasurement),
    Beacon(BeaconMeasurement),
}

/// The infrared receivers fitted to the vehicle.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
pub enum BeaconReceiver {
    FrontLeft,
    FrontCentre,
    FrontRight,
    RearCentre,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LocalizationFix {
    /// A valid fix.
    pub fn new(distance_to_target_m: f64, heading_error_rad: f64) -> Self {
        Self {
            valid: true,
            distance_to_target_m,
            heading_error_rad,
        }
    }

    /// A fix marking that no geometry could be computed this cycle.
    pub fn invalid() -> Self {
        Self::default()
    }
}

impl Measurement {
    /// The source able to process this measurement.
    pub fn source(&self) -> LocSource {
        match self {
            Measurement::Satellite(_) => LocSource::Satellite,
            Measurement::Ranging(_) => LocSource::Ranging,
            Measurement::Beacon(_) => LocSource::Beacon,
        }
    }
}

impl AnchorSet {
    /// Get the anchor with the given network ID.
    pub fn get(&self, network_id: u16) -> Option<&Anchor> {
        self.anchors.iter().find(|a| a.network_id == network_id)
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }
}

impl Default for AnchorSet {
    /// Three anchors, left, rear and right of the dock, 2.5 m from its centre.
    fn default() -> Self {
        Self {
            anchors: vec![
                Anchor {
                    network_id: 0x1156,
                    position_m: [-2.5, 0.0],
                },
                Anchor {
                    network_id: 0x256B,
                    position_m: [0.0, -2.5],
                },
                Anchor {
                    network_id: 0x3325,
                    position_m: [2.5, 0.0],
                },
            ],
        }
    }
}

impl BeaconReceiver {
    /// All receivers, in the order used to index [`BeaconMeasurement::seen`].
    pub const ALL: [BeaconReceiver; NUM_BEACON_RECEIVERS] = [
        BeaconReceiver::FrontLeft,
        BeaconReceiver::FrontCentre,
        BeaconReceiver::FrontRight,
        BeaconReceiver::RearCentre,
    ];

    /// Index of the receiver in [`BeaconMeasurement::seen`].
    pub fn index(&self) -> usize {
        match self {
            BeaconReceiver::FrontLeft => 0,
            BeaconReceiver::FrontCentre => 1,
            BeaconReceiver::FrontRight => 2,
            BeaconReceiver::RearCentre => 3,
        }
    }
}
