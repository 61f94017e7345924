//! Satellite positioning provider

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{fix_or_invalid, LocError, LocalizationProvider, SatelliteParams};
use comms_if::eqpt::loc::{
    AnchorSet, LocSource, LocalizationFix, Measurement, SatelliteMeasurement, TargetLocation,
};
use util::maths::wrap_pi;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Mean radius of the Earth.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Computes fixes from the great circle between the vehicle's satellite
/// position and the dock.
#[derive(Debug, Default)]
pub struct SatelliteProvider {
    params: SatelliteParams,

    target: Option<TargetLocation>,

    measurement: Option<SatelliteMeasurement>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SatelliteProvider {
    pub fn new(params: SatelliteParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    fn compute(&self) -> Result<LocalizationFix, LocError> {
        let target = self.target.as_ref().ok_or(LocError::NotConfigured)?;
        let meas = self.measurement.as_ref().ok_or(LocError::NoMeasurement)?;

        if meas.num_satellites < self.params.min_satellites {
            return Err(LocError::TooFewSatellites(
                meas.num_satellites,
                self.params.min_satellites,
            ));
        }

        if !(meas.latitude_deg.is_finite()
            && meas.longitude_deg.is_finite()
            && meas.course_rad.is_finite())
        {
            return Err(LocError::NonFinite);
        }

        let (dist_m, bearing_rad) = distance_and_bearing(
            meas.latitude_deg,
            meas.longitude_deg,
            target.latitude_deg,
            target.longitude_deg,
        );

        // Both angles are clockwise from north, so course minus bearing is
        // positive when the dock is to the left
        Ok(LocalizationFix::new(
            dist_m,
            wrap_pi(meas.course_rad - bearing_rad),
        ))
    }
}

impl LocalizationProvider for SatelliteProvider {
    fn source(&self) -> LocSource {
        LocSource::Satellite
    }

    fn configure(&mut self, target: &TargetLocation, _anchors: &AnchorSet) {
        self.target = Some(*target);
    }

    fn set_measurement(&mut self, measurement: &Measurement) {
        if let Measurement::Satellite(m) = measurement {
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

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Haversine distance and initial bearing (clockwise from north, in the range
/// [-pi, pi]) from point 1 to point 2.
pub fn distance_and_bearing(lat1_deg: f64, lon1_deg: f64, lat2_deg: f64, lon2_deg: f64) -> (f64, f64) {
    let phi_1 = lat1_deg.to_radians();
    let phi_2 = lat2_deg.to_radians();
    let d_phi = phi_2 - phi_1;
    let d_lambda = (lon2_deg - lon1_deg).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi_1.cos() * phi_2.cos() * (d_lambda / 2.0).sin().powi(2);
    let dist_m = 2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());

    let bearing_rad = (d_lambda.sin() * phi_2.cos())
        .atan2(phi_1.cos() * phi_2.sin() - phi_1.sin() * phi_2.cos() * d_lambda.cos());

    (dist_m, bearing_rad)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    /// Metres per degree of latitude
    const M_PER_DEG: f64 = EARTH_RADIUS_M * PI / 180.0;

    fn provider() -> SatelliteProvider {
        let mut p = SatelliteProvider::new(SatelliteParams::default());
        p.configure(
            &TargetLocation {
                latitude_deg: 52.0,
                longitude_deg: -1.0,
            },
            &AnchorSet::default(),
        );
        p
    }

    fn meas(lat: f64, lon: f64, course_rad: f64, num_satellites: u8) -> Measurement {
        Measurement::Satellite(SatelliteMeasurement {
            latitude_deg: lat,
            longitude_deg: lon,
            course_rad,
            num_satellites,
        })
    }

    #[test]
    fn test_distance_and_bearing() {
        // 100 m due north
        let (d, b) = distance_and_bearing(52.0, -1.0, 52.0 + 100.0 / M_PER_DEG, -1.0);
        assert!((d - 100.0).abs() < 1e-3);
        assert!(b.abs() < 1e-9);

        // Due east
        let (_, b) = distance_and_bearing(0.0, 0.0, 0.0, 0.001);
        assert!((b - FRAC_PI_2).abs() < 1e-9);

        // Same point
        let (d, _) = distance_and_bearing(52.0, -1.0, 52.0, -1.0);
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_fix() {
        let mut p = provider();

        // 20 m south of the dock, heading east, so the dock is to the left
        p.set_measurement(&meas(52.0 - 20.0 / M_PER_DEG, -1.0, FRAC_PI_2, 6));
        let fix = p.poll();
        assert!(fix.valid);
        assert!((fix.distance_to_target_m - 20.0).abs() < 1e-3);
        assert!((fix.heading_error_rad - FRAC_PI_2).abs() < 1e-6);

        // Heading west the dock is to the right
        p.set_measurement(&meas(52.0 - 20.0 / M_PER_DEG, -1.0, 1.5 * PI, 6));
        let fix = p.poll();
        assert!((fix.heading_error_rad + FRAC_PI_2).abs() < 1e-6);

        // Nothing new since the last poll
        assert!(!p.poll().valid);
    }

    #[test]
    fn test_invalid() {
        // Not configured
        let mut p = SatelliteProvider::new(SatelliteParams::default());
        p.set_measurement(&meas(52.0, -1.0, 0.0, 8));
        assert!(!p.poll().valid);

        // No measurement
        let mut p = provider();
        assert!(!p.poll().valid);

        // Too few satellites
        p.set_measurement(&meas(52.0, -1.0, 0.0, 3));
        assert!(!p.poll().valid);

        // Non-finite
        p.set_measurement(&meas(f64::NAN, -1.0, 0.0, 8));
        assert!(!p.poll().valid);

        // Cleared measurements aren't reused
        p.set_measurement(&meas(52.001, -1.0, 0.0, 8));
        p.clear_measurement();
        assert!(!p.poll().valid);
    }
}
