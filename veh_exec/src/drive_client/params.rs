//! Parameters structure for the drive client

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Geometry and capabilities of the differential drivetrain.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct DriveParams {
    /// Units: meters
    pub wheel_radius_m: f64,

    /// Distance between the centres of the left and right wheels.
    ///
    /// Units: meters
    pub track_width_m: f64,

    /// Maximum speed of either drive actuator.
    ///
    /// Units: radians/second
    pub max_wheel_rate_rads: f64,
}

impl Default for DriveParams {
    fn default() -> Self {
        Self {
            wheel_radius_m: 0.1,
            track_width_m: 0.5,
            max_wheel_rate_rads: 14.0,
        }
    }
}
