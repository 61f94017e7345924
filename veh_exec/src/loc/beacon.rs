//! Infrared beacon provider

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{fix_or_invalid, BeaconParams, LocError, LocalizationProvider};
use comms_if::eqpt::loc::{
    BeaconMeasurement, BeaconReceiver, LocSource, LocalizationFix, Measurement,
};
use util::maths::wrap_pi;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Resultants shorter than this have no meaningful direction.
const MIN_RESULTANT: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Steers on the receivers which can see the dock's beacon, with distance
/// from the short range sensor.
#[derive(Debug, Default)]
pub struct BeaconProvider {
    params: BeaconParams,

    measurement: Option<BeaconMeasurement>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl BeaconProvider {
    pub fn new(params: BeaconParams) -> Self {
        Self {
            params,
            measurement: None,
        }
    }

    fn compute(&self) -> Result<LocalizationFix, LocError> {
        let meas = self.measurement.as_ref().ok_or(LocError::NoMeasurement)?;

        // Circular mean of the bearings of every receiver seeing the beacon
        let (mut sin_sum, mut cos_sum, mut num_seen) = (0f64, 0f64, 0usize);
        for rx in BeaconReceiver::ALL.iter() {
            if meas.seen[rx.index()] {
                let bearing = self.params.receiver_bearing_rad[rx.index()];
                sin_sum += bearing.sin();
                cos_sum += bearing.cos();
                num_seen += 1;
            }
        }

        if num_seen == 0 {
            return Err(LocError::BeaconNotSeen);
        }

        let range_m = meas.range_m.ok_or(LocError::NoRange)?;
        if !range_m.is_finite() || range_m < 0.0 {
            return Err(LocError::NonFinite);
        }

        if sin_sum.hypot(cos_sum) < MIN_RESULTANT {
            return Err(LocError::DegenerateGeometry);
        }

        Ok(LocalizationFix::new(range_m, wrap_pi(sin_sum.atan2(cos_sum))))
    }
}

impl LocalizationProvider for BeaconProvider {
    fn source(&self) -> LocSource {
        LocSource::Beacon
    }

    fn set_measurement(&mut self, measurement: &Measurement) {
        if let Measurement::Beacon(m) = measurement {
            self.measurement = Some(*m);
        }
    }

    fn clear_measurement(&mut self) {
        self.measurement = None;
    }

    fn poll(&mut self) -> LocalizationFix {
        let fix = fix_or_invalid(self.source(), self.compute());
        self.measurement = None;
        fix
    }
}
