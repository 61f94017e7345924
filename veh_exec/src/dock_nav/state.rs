//! Implementations for the DockNav state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace};
use serde::Serialize;

// Internal
use super::{DockNavParams, LostFixPolicy, PhaseParams};
use comms_if::eqpt::{
    drive::VelocityCommand,
    loc::{AnchorSet, LocSource, LocalizationFix, TargetLocation},
};
use util::maths::clamp_abs;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Docking navigator state
#[derive(Debug, Default)]
pub struct DockNav {
    pub(crate) params: DockNavParams,

    phase: DockingPhase,

    dock: Option<DockConfig>,

    last_cmd: VelocityCommand,
}

/// The location of the dock, which must be set before docking may begin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DockConfig {
    /// Global location of the dock
    pub target: TargetLocation,

    /// Ranging anchors installed around the dock
    pub anchors: AnchorSet,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Phases of the docking navigator.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub enum DockingPhase {
    /// Not docking.
    Disabled,

    /// Homing on satellite positioning.
    CoarseSatellite,

    /// Homing on ranging to the dock anchors.
    MediumRanging,

    /// Final approach on the dock beacon.
    FineBeacon,

    /// In the dock.
    Homed,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for DockingPhase {
    fn default() -> Self {
        DockingPhase::Disabled
    }
}

impl DockingPhase {
    /// The localisation source used during this phase, if any.
    pub fn loc_source(&self) -> Option<LocSource> {
        match self {
            DockingPhase::Disabled | DockingPhase::Homed => None,
            DockingPhase::CoarseSatellite => Some(LocSource::Satellite),
            DockingPhase::MediumRanging => Some(LocSource::Ranging),
            DockingPhase::FineBeacon => Some(LocSource::Beacon),
        }
    }

    /// Position of the phase in the docking sequence.
    pub fn ordinal(&self) -> u8 {
        match self {
            DockingPhase::Disabled => 0,
            DockingPhase::CoarseSatellite => 1,
            DockingPhase::MediumRanging => 2,
            DockingPhase::FineBeacon => 3,
            DockingPhase::Homed => 4,
        }
    }
}

impl DockNav {
    /// Create a new navigator with the given parameters, which will be
    /// disabled and not configured.
    pub fn new(params: DockNavParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    /// Set the dock the navigator homes on to.
    pub fn configure(&mut self, target: TargetLocation, anchors: AnchorSet) {
        info!(
            "Dock configured at ({:.6}, {:.6}) deg with {} anchors",
            target.latitude_deg,
            target.longitude_deg,
            anchors.len()
        );
        self.dock = Some(DockConfig { target, anchors });
    }

    /// Returns true if a dock has been configured.
    pub fn is_configured(&self) -> bool {
        self.dock.is_some()
    }

    pub fn dock(&self) -> Option<&DockConfig> {
        self.dock.as_ref()
    }

    pub fn phase(&self) -> DockingPhase {
        self.phase
    }

    /// Begin docking from the coarsest phase.
    pub fn start(&mut self) {
        self.last_cmd = VelocityCommand::zero();
        self.set_phase(DockingPhase::CoarseSatellite);
    }

    /// Stop docking, returning to `Disabled` from any phase.
    pub fn stop(&mut self) {
        self.last_cmd = VelocityCommand::zero();
        self.set_phase(DockingPhase::Disabled);
    }

    /// Step the navigator with this cycle's fix from the current phase's
    /// source.
    ///
    /// `finer_source_ok` reports whether the ranging source is able to take
    /// over from satellite positioning, and is only used in the
    /// `CoarseSatellite` phase.
    ///
    /// The returned command is computed with the gains of the phase the
    /// navigator was in at the start of the call. The phase advances at most
    /// once per call, and never on an invalid fix.
    pub fn advance(&mut self, fix: &LocalizationFix, finer_source_ok: bool) -> VelocityCommand {
        let (cmd, next_phase) = match self.phase {
            DockingPhase::Disabled | DockingPhase::Homed => (VelocityCommand::zero(), self.phase),

            phase if !fix.valid => (self.lost_fix_cmd(phase), phase),

            DockingPhase::CoarseSatellite => {
                let p = &self.params.coarse;
                let next = if fix.distance_to_target_m <= p.advance_dist_m && finer_source_ok {
                    DockingPhase::MediumRanging
                } else {
                    DockingPhase::CoarseSatellite
                };
                (proportional(p, fix), next)
            }

            DockingPhase::MediumRanging => {
                let p = &self.params.medium;
                let next = if fix.distance_to_target_m <= p.advance_dist_m {
                    DockingPhase::FineBeacon
                } else {
                    DockingPhase::MediumRanging
                };
                (proportional(p, fix), next)
            }

            DockingPhase::FineBeacon => {
                let p = &self.params.fine;
                if fix.distance_to_target_m <= p.advance_dist_m {
                    (VelocityCommand::zero(), DockingPhase::Homed)
                } else {
                    let mut cmd = proportional(p, fix);

                    // Don't move forward until aligned with the dock
                    if !(fix.heading_error_rad.abs() < self.params.align_threshold_rad) {
                        cmd.linear_ms = 0.0;
                    }

                    (cmd, DockingPhase::FineBeacon)
                }
            }
        };

        trace!(
            "DockNav {:?}: fix {:?} -> cmd {:?}",
            self.phase,
            fix,
            cmd
        );

        self.set_phase(next_phase);
        self.last_cmd = cmd;

        cmd
    }

    /// Get the controller parameters of a phase, or `None` for phases with
    /// no controller.
    pub fn phase_params(&self, phase: DockingPhase) -> Option<&PhaseParams> {
        match phase {
            DockingPhase::Disabled | DockingPhase::Homed => None,
            DockingPhase::CoarseSatellite => Some(&self.params.coarse),
            DockingPhase::MediumRanging => Some(&self.params.medium),
            DockingPhase::FineBeacon => Some(&self.params.fine),
        }
    }

    fn lost_fix_cmd(&self, phase: DockingPhase) -> VelocityCommand {
        match (self.params.lost_fix_policy, self.phase_params(phase)) {
            (LostFixPolicy::HoldLast, Some(p)) => VelocityCommand::new(
                clamp_abs(self.last_cmd.linear_ms, p.max_linear_ms),
                clamp_abs(self.last_cmd.angular_rads, p.max_angular_rads),
            ),
            _ => VelocityCommand::zero(),
        }
    }

    fn set_phase(&mut self, phase: DockingPhase) {
        if phase != self.phase {
            info!("DockNav phase change: {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Proportional control on distance and heading error, limited to the
/// phase's bounds.
fn proportional(p: &PhaseParams, fix: &LocalizationFix) -> VelocityCommand {
    VelocityCommand::new(
        clamp_abs(p.k_linear * fix.distance_to_target_m, p.max_linear_ms),
        clamp_abs(p.k_angular * fix.heading_error_rad, p.max_angular_rads),
    )
}
