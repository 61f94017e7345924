//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Environment variable pointing at the root of the software checkout.
pub const SW_ROOT_ENV_VAR: &str = "VEH_SW_ROOT";

/// Get the root directory of the software, as given by the `VEH_SW_ROOT`
/// environment variable.
pub fn get_veh_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
