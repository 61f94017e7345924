//! Ranging provider
//!
//! Solves the vehicle's position in the dock frame from its ranges to the
//! anchors around the dock. Subtracting the first anchor's circle equation
//! from the others gives a linear system in the position, which is solved in
//! the least squares sense through its normal equations.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use nalgebra::{Matrix2, Vector2};

use super::{fix_or_invalid, LocError, LocalizationProvider, RangingParams};
use comms_if::eqpt::loc::{
    AnchorSet, LocSource, LocalizationFix, Measurement, RangingMeasurement, TargetLocation,
};
use util::maths::wrap_pi;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Fewest anchors which fix a position in 2D.
const MIN_SOLVABLE_ANCHORS: usize = 3;

/// Determinants of the normal matrix below this are treated as singular.
const SINGULAR_DET_THRESHOLD: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RangingProvider {
    params: RangingParams,

    anchors: AnchorSet,

    measurement: Option<RangingMeasurement>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RangingProvider {
    /// Create a new provider with no anchors, which will not be available
    /// until configured.
    pub fn new(params: RangingParams) -> Self {
        Self {
            params,
            anchors: AnchorSet { anchors: vec![] },
            measurement: None,
        }
    }

    fn compute(&self) -> Result<LocalizationFix, LocError> {
        if self.anchors.is_empty() {
            return Err(LocError::NotConfigured);
        }

        let meas = self.measurement.as_ref().ok_or(LocError::NoMeasurement)?;

        if !meas.heading_rad.is_finite() {
            return Err(LocError::NonFinite);
        }

        let mut circles = Vec::with_capacity(meas.ranges_m.len());
        for (id, range_m) in meas.ranges_m.iter() {
            let anchor = self.anchors.get(*id).ok_or(LocError::UnknownAnchor(*id))?;
            if !range_m.is_finite() || *range_m < 0.0 {
                return Err(LocError::NonFinite);
            }
            circles.push((Vector2::new(anchor.position_m[0], anchor.position_m[1]), *range_m));
        }

        let min_anchors = self.params.min_anchors.max(MIN_SOLVABLE_ANCHORS);
        if circles.len() < min_anchors {
            return Err(LocError::TooFewAnchors(circles.len(), min_anchors));
        }

        // Fixed order so the solution doesn't depend on hash order
        circles.sort_by(|a, b| {
            (a.0[0], a.0[1])
                .partial_cmp(&(b.0[0], b.0[1]))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let pos_m = trilaterate(&circles)?;

        trace!("Ranging position: ({:.3}, {:.3}) m", pos_m[0], pos_m[1]);

        let bearing_rad = (-pos_m[1]).atan2(-pos_m[0]);

        Ok(LocalizationFix::new(
            pos_m.norm(),
            wrap_pi(bearing_rad - meas.heading_rad),
        ))
    }
}

impl LocalizationProvider for RangingProvider {
    fn source(&self) -> LocSource {
        LocSource::Ranging
    }

    fn configure(&mut self, _target: &TargetLocation, anchors: &AnchorSet) {
        self.anchors = anchors.clone();
    }

    fn set_measurement(&mut self, measurement: &Measurement) {
        if let Measurement::Ranging(m) = measurement {
            self.measurement = Some(m.clone());
        }
    }

    fn clear_measurement(&mut self) {
        self.measurement = None;
    }

    /// Available once enough anchors are configured and the pending
    /// measurement gives a position. The measurement is not consumed.
    fn is_available(&self) -> bool {
        self.anchors.len() >= self.params.min_anchors.max(MIN_SOLVABLE_ANCHORS)
            && self.compute().is_ok()
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

/// Least squares position from a set of (anchor position, range) circles.
///
/// At least three circles must be given.
pub fn trilaterate(circles: &[(Vector2<f64>, f64)]) -> Result<Vector2<f64>, LocError> {
    let (p0, r0) = match circles.first() {
        Some(c) => *c,
        None => return Err(LocError::TooFewAnchors(0, MIN_SOLVABLE_ANCHORS)),
    };

    // Accumulate A^T A and A^T b row by row
    let mut ata = Matrix2::<f64>::zeros();
    let mut atb = Vector2::<f64>::zeros();

    for (pi, ri) in circles.iter().skip(1) {
        let row = 2.0 * (pi - p0);
        let b = r0 * r0 - ri * ri + pi.norm_squared() - p0.norm_squared();

        ata += row * row.transpose();
        atb += row * b;
    }

    if ata.determinant().abs() < SINGULAR_DET_THRESHOLD {
        return Err(LocError::DegenerateGeometry);
    }

    ata.try_inverse()
        .map(|inv| inv * atb)
        .ok_or(LocError::DegenerateGeometry)
}
