//! # Localisation module
//!
//! Turns the raw output of the vehicle's positioning sensors into [`LocalizationFix`]es relative
//! to the dock. There is one provider per [`LocSource`], all sitting behind the
//! [`LocalizationProvider`] trait so that the docking navigator never sees which modality it is
//! being steered by.
//!
//! Measurements are pushed into the [`LocMgr`] as they arrive and consumed by the next poll, so a
//! provider which has not received anything since the last poll reports an invalid fix. Each
//! provider drops its own measurement when polled, and the manager drops those of the providers
//! which were not polled.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod beacon;
mod params;
mod ranging;
mod satellite;

pub use beacon::BeaconProvider;
pub use params::*;
pub use ranging::RangingProvider;
pub use satellite::{SatelliteProvider, EARTH_RADIUS_M};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, warn};
use std::collections::HashMap;
use thiserror::Error;

use comms_if::eqpt::loc::{AnchorSet, LocSource, LocalizationFix, Measurement, TargetLocation};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of positioning relative to the dock.
///
/// Providers must not block, and report an inability to compute a fix as an
/// invalid fix rather than an error.
pub trait LocalizationProvider {
    /// The modality this provider uses.
    fn source(&self) -> LocSource;

    /// Set the dock the provider computes fixes relative to.
    fn configure(&mut self, _target: &TargetLocation, _anchors: &AnchorSet) {}

    /// Give the provider a new measurement. Measurements from another source
    /// are ignored.
    fn set_measurement(&mut self, _measurement: &Measurement) {}

    /// Drop any measurement held by the provider.
    fn clear_measurement(&mut self) {}

    /// Returns true if the provider could produce a valid fix from what it
    /// currently holds. Must not consume the pending measurement.
    fn is_available(&self) -> bool {
        true
    }

    /// Compute this cycle's fix.
    fn poll(&mut self) -> LocalizationFix;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Owns one provider per localisation source and routes measurements and
/// polls to them.
pub struct LocMgr {
    providers: HashMap<LocSource, Box<dyn LocalizationProvider>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Reasons a provider could not compute a fix.
#[derive(Debug, Error, PartialEq)]
pub enum LocError {
    #[error("No measurement received since the last poll")]
    NoMeasurement,

    #[error("The dock has not been configured")]
    NotConfigured,

    #[error("Satellite solution uses {0} satellites but at least {1} are required")]
    TooFewSatellites(u8, u8),

    #[error("Only {0} known anchors responded but at least {1} are required")]
    TooFewAnchors(usize, usize),

    #[error("Range received from unknown anchor {0:#06x}")]
    UnknownAnchor(u16),

    #[error("Anchor geometry is degenerate, the position cannot be solved")]
    DegenerateGeometry,

    #[error("No beacon receiver sees the dock")]
    BeaconNotSeen,

    #[error("No range to the dock is available")]
    NoRange,

    #[error("Measurement contains a non-finite value")]
    NonFinite,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LocMgr {
    /// Create a manager with the standard provider for every source.
    pub fn new(params: &LocParams) -> Self {
        Self::with_providers(vec![
            Box::new(SatelliteProvider::new(params.satellite)),
            Box::new(RangingProvider::new(params.ranging)),
            Box::new(BeaconProvider::new(params.beacon)),
        ])
    }

    /// Create a manager from a set of providers. If two providers share a
    /// source the later one is used.
    pub fn with_providers(providers: Vec<Box<dyn LocalizationProvider>>) -> Self {
        let mut map = HashMap::new();
        for p in providers {
            if map.insert(p.source(), p).is_some() {
                warn!("Duplicate localisation provider, the earlier one is replaced");
            }
        }

        Self { providers: map }
    }

    /// Set the dock on every provider.
    pub fn configure(&mut self, target: &TargetLocation, anchors: &AnchorSet) {
        for p in self.providers.values_mut() {
            p.configure(target, anchors);
        }
    }

    /// Route a measurement to the provider for its source.
    pub fn set_measurement(&mut self, measurement: &Measurement) {
        match self.providers.get_mut(&measurement.source()) {
            Some(p) => p.set_measurement(measurement),
            None => debug!(
                "No provider for {:?}, measurement dropped",
                measurement.source()
            ),
        }
    }

    /// Returns true if a provider for `source` exists and is available.
    pub fn is_available(&self, source: LocSource) -> bool {
        self.providers
            .get(&source)
            .map(|p| p.is_available())
            .unwrap_or(false)
    }

    /// Poll the provider for `source`, then drop the measurements held by
    /// the other providers so that none are used twice.
    ///
    /// `None`, or a source with no provider, gives an invalid fix. A fix
    /// claiming to be valid but containing non-finite values is reported as
    /// invalid.
    pub fn poll(&mut self, source: Option<LocSource>) -> LocalizationFix {
        let fix = match source.and_then(|s| self.providers.get_mut(&s)) {
            Some(p) => p.poll(),
            None => LocalizationFix::invalid(),
        };

        for (s, p) in self.providers.iter_mut() {
            if Some(*s) != source {
                p.clear_measurement();
            }
        }

        if fix.valid && !(fix.distance_to_target_m.is_finite() && fix.heading_error_rad.is_finite())
        {
            warn!("Provider for {:?} produced a non-finite fix", source);
            return LocalizationFix::invalid();
        }

        fix
    }
}

impl Default for LocMgr {
    fn default() -> Self {
        Self::new(&LocParams::default())
    }
}

impl std::fmt::Debug for LocMgr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut sources: Vec<_> = self.providers.keys().collect();
        sources.sort_by_key(|s| format!("{:?}", s));
        f.debug_struct("LocMgr").field("sources", &sources).finish()
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert the result of a provider's computation into a fix, logging the
/// reason for any failure.
pub(crate) fn fix_or_invalid(
    source: LocSource,
    result: Result<LocalizationFix, LocError>,
) -> LocalizationFix {
    match result {
        Ok(fix) => fix,
        Err(e) => {
            debug!("{:?} fix unavailable: {}", source, e);
            LocalizationFix::invalid()
        }
    }
}
