//! # Drive Client
//!
//! Converts body velocity commands into wheel speed demands for the differential drivetrain and
//! sends them to the drive equipment.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;

pub use params::DriveParams;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{trace, warn};

use comms_if::eqpt::drive::{ActId, DriveDems, DriveDemsResponse, VelocityCommand};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Allowance for rounding when comparing wheel rates against the limit.
///
/// Units: radians/second
const WHEEL_RATE_TOLERANCE_RADS: f64 = 1e-9;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The drive equipment, real or simulated.
pub trait DriveInterface {
    /// Send demands to the equipment, returning its response.
    fn send_demands(&mut self, demands: &DriveDems) -> Result<DriveDemsResponse, DriveClientError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Client for a two wheel differential drivetrain.
pub struct DiffDrive<D: DriveInterface> {
    params: DriveParams,

    iface: D,
}

/// The largest command a source of velocity commands can produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandBounds {
    /// Name of the source, for error messages.
    pub name: &'static str,

    /// Units: meters/second
    pub max_linear_ms: f64,

    /// Units: radians/second
    pub max_angular_rads: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum DriveClientError {
    #[error("The client is not connected to the drive equipment")]
    NotConnected,

    #[error("The drive equipment reported a fault: {0}")]
    EqptFault(String),

    #[error(
        "The {name} limits ({linear_ms} m/s, {angular_rads} rad/s) need {needed_rads:.3} rad/s \
        from a wheel but the maximum is {max_rads} rad/s"
    )]
    BoundsExceedWheelLimit {
        name: &'static str,
        linear_ms: f64,
        angular_rads: f64,
        needed_rads: f64,
        max_rads: f64,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<D: DriveInterface> DiffDrive<D> {
    pub fn new(params: DriveParams, iface: D) -> Self {
        Self { params, iface }
    }

    /// Send a velocity command to the drivetrain.
    ///
    /// If the equipment acknowledges the demands its response is returned,
    /// otherwise an `Err()`.
    pub fn send(&mut self, cmd: &VelocityCommand) -> Result<DriveDemsResponse, DriveClientError> {
        let dems = calc_dems(&self.params, cmd);

        trace!("Drive demands: {:?}", dems.speed_rads);

        self.iface.send_demands(&dems)
    }

    /// Check that every command within `bounds` can be driven without a
    /// wheel exceeding its maximum rate.
    pub fn check_bounds(&self, bounds: &[CommandBounds]) -> Result<(), DriveClientError> {
        check_bounds(&self.params, bounds)
    }

    pub fn iface(&self) -> &D {
        &self.iface
    }

    pub fn iface_mut(&mut self) -> &mut D {
        &mut self.iface
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Check that the largest command of each source needs no more than the
/// maximum wheel rate, so that [`calc_dems`] never has to scale a command.
pub fn check_bounds(params: &DriveParams, bounds: &[CommandBounds]) -> Result<(), DriveClientError> {
    for b in bounds.iter() {
        let needed_rads = (b.max_linear_ms.abs()
            + b.max_angular_rads.abs() * params.track_width_m / 2.0)
            / params.wheel_radius_m;

        if !(needed_rads <= params.max_wheel_rate_rads + WHEEL_RATE_TOLERANCE_RADS) {
            return Err(DriveClientError::BoundsExceedWheelLimit {
                name: b.name,
                linear_ms: b.max_linear_ms,
                angular_rads: b.max_angular_rads,
                needed_rads,
                max_rads: params.max_wheel_rate_rads,
            });
        }
    }

    Ok(())
}

/// Calculate the wheel speeds for a body velocity.
///
/// If either wheel would exceed the maximum rate both are scaled down
/// together, keeping the curvature of the path, and a warning is logged.
/// Commands within bounds accepted by [`check_bounds`] are never scaled.
/// Non-finite commands give zero demands.
pub fn calc_dems(params: &DriveParams, cmd: &VelocityCommand) -> DriveDems {
    let mut dems = DriveDems::default();

    if !(cmd.linear_ms.is_finite() && cmd.angular_rads.is_finite()) {
        return dems;
    }

    let half_track_m = params.track_width_m / 2.0;
    let mut left_rads = (cmd.linear_ms - cmd.angular_rads * half_track_m) / params.wheel_radius_m;
    let mut right_rads = (cmd.linear_ms + cmd.angular_rads * half_track_m) / params.wheel_radius_m;

    let peak_rads = left_rads.abs().max(right_rads.abs());
    if peak_rads > params.max_wheel_rate_rads + WHEEL_RATE_TOLERANCE_RADS {
        warn!(
            "Command ({:.3} m/s, {:.3} rad/s) needs {:.3} rad/s from a wheel, scaled down to {} rad/s",
            cmd.linear_ms, cmd.angular_rads, peak_rads, params.max_wheel_rate_rads
        );
        let scale = params.max_wheel_rate_rads / peak_rads;
        left_rads *= scale;
        right_rads *= scale;
    }

    dems.speed_rads.insert(ActId::DrvLeft, left_rads);
    dems.speed_rads.insert(ActId::DrvRight, right_rads);

    dems
}
