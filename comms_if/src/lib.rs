//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the vehicle software: the telecommands
//! accepted by the executable and the data exchanged with drive and localisation equipment.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod tc;

/// Command and response definitions for equipment (drivetrain and localisation sensors)
pub mod eqpt;
