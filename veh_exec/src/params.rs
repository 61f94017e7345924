//! # Vehicle Executable Parameters
//!
//! This module provide parameters for the vehicle executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use thiserror::Error;

use crate::drive_client::DriveParams;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Longest accepted cycle period, the watchdog can't be kept fed beyond this.
///
/// Units: seconds
pub const MAX_CYCLE_PERIOD_S: f64 = 10.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct VehExecParams {
    /// Target period of one cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Number of consecutive failures to send demands to the drivetrain
    /// tolerated before the vehicle is halted.
    pub max_drive_failures: u64,

    /// Write the supervisor status archive every cycle.
    pub archive_enabled: bool,

    /// Drivetrain geometry.
    pub drive: DriveParams,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum ExecParamsError {
    #[error("The cycle period must be greater than 0 and at most 10 s, got {0}")]
    InvalidCyclePeriod(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VehExecParams {
    /// Check the values loaded from file can be used to run the executable.
    pub fn validate(&self) -> Result<(), ExecParamsError> {
        if !(self.cycle_period_s > 0.0 && self.cycle_period_s <= MAX_CYCLE_PERIOD_S) {
            return Err(ExecParamsError::InvalidCyclePeriod(self.cycle_period_s));
        }

        Ok(())
    }

    /// Number of cycles per second.
    pub fn cycle_frequency_hz(&self) -> f64 {
        1.0 / self.cycle_period_s
    }
}

impl Default for VehExecParams {
    fn default() -> Self {
        Self {
            cycle_period_s: 0.1,
            max_drive_failures: 5,
            archive_enabled: true,
            drive: DriveParams::default(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate() {
        let mut p = VehExecParams::default();
        assert_eq!(p.validate(), Ok(()));
        assert_eq!(p.cycle_frequency_hz(), 10.0);

        for bad in [0.0, -0.1, f64::NAN, f64::INFINITY, 1e300].iter() {
            p.cycle_period_s = *bad;
            assert!(p.validate().is_err(), "{} accepted", bad);
        }

        let p: VehExecParams = util::params::parse("cycle_period_s = -1.0").unwrap();
        assert_eq!(p.validate(), Err(ExecParamsError::InvalidCyclePeriod(-1.0)));
    }
}
