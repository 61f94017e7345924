//! # Vehicle library.
//!
//! This library allows other crates in the workspace to access items defined inside the vehicle
//! crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Global data store for the executable
pub mod data_store;

/// Docking navigator - steers the vehicle into its charging dock using the finest available
/// localisation source
pub mod dock_nav;

/// Drive client - converts velocity commands into wheel demands for the drivetrain
pub mod drive_client;

/// Failsafe monitor - combines the command watchdog and the hardware interlock
pub mod failsafe;

/// Localisation module - provides fixes relative to the dock from the positioning sensors
pub mod loc;

/// Executable parameters
pub mod params;

/// Simulation client - a simulated vehicle standing in for the drivetrain and sensors
#[cfg(feature = "sim")]
pub mod sim_client;

/// Supervisory controller - owns the operating mode and produces each cycle's command
pub mod supervisor;
