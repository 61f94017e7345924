//! # Docking navigator module
//!
//! Steers the vehicle, unattended, into its charging dock. Navigation is split into phases, each
//! tied to one localisation source and one set of controller gains:
//!
//! - `CoarseSatellite` - satellite positioning, used until the vehicle is within range of the
//!   dock's ranging anchors.
//! - `MediumRanging` - ranging to the anchors around the dock.
//! - `FineBeacon` - the infrared beacon on the dock, used for the final alignment and approach.
//! - `Homed` - the vehicle is in the dock, nothing more is commanded.
//!
//! Phases only ever advance towards `Homed`. A phase whose source stops producing fixes holds the
//! vehicle in that phase, there is no retreat to a coarser source.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;
