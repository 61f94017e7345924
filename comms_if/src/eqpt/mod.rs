//! # Equipment Interface
//!
//! This module defines the interface structures exchanged with the drivetrain and localisation
//! equipment.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Drivetrain demands and responses
pub mod drive;

/// Localisation fixes and raw sensor measurements
pub mod loc;
