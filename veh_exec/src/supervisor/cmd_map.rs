//! Mapping of requested velocities into commands

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::CmdMapParams;
use comms_if::eqpt::drive::VelocityCommand;
use util::maths::{clamp_abs, deadzone};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Applies a deadzone then saturation to each axis of a requested velocity.
#[derive(Debug, Clone, Copy)]
pub struct CmdMapper {
    params: CmdMapParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CmdMapper {
    pub fn new(params: CmdMapParams) -> Self {
        Self { params }
    }

    pub fn map(&self, linear_ms: f64, angular_rads: f64) -> VelocityCommand {
        VelocityCommand::new(
            map_axis(
                linear_ms,
                self.params.deadzone_linear_ms,
                self.params.max_linear_ms,
            ),
            map_axis(
                angular_rads,
                self.params.deadzone_angular_rads,
                self.params.max_angular_rads,
            ),
        )
    }
}

fn map_axis(value: f64, width: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }

    clamp_abs(deadzone(value, width), max)
}
