//! Implementations for the Supervisor state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace, warn};
use serde::Serialize;
use std::convert::Infallible;

// Internal
use super::{CmdMapper, ModeRejected, SupervisorError, SupervisorParams};
use crate::{
    dock_nav::{DockConfig, DockNav, DockNavParams, DockingPhase},
    drive_client::CommandBounds,
    failsafe::{FailsafeMonitor, FailsafeStatus, LogIndicator, SafetyIndicator},
    loc::{LocMgr, LocParams},
};
use comms_if::{
    eqpt::{
        drive::VelocityCommand,
        loc::{AnchorSet, LocSource, TargetLocation},
    },
    tc::mode::OperatingMode,
};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Supervisory controller
pub struct Supervisor {
    params: SupervisorParams,

    state: SupervisorState,

    failsafe: FailsafeMonitor,

    dock_nav: DockNav,

    loc_mgr: LocMgr,

    manual_map: CmdMapper,

    external_map: CmdMapper,

    /// Time of the most recent failsafe evaluation
    last_eval_time_s: f64,

    last_output: VelocityCommand,

    arch_status: Archiver,
}

/// The supervisor's mode and safety state.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct SupervisorState {
    pub current_mode: OperatingMode,

    /// Time the most recent command was processed, `None` before the first.
    pub last_command_time_s: Option<f64>,

    /// Verdict of the most recent failsafe evaluation. False until the first
    /// evaluation.
    pub failsafe_ok: bool,

    /// Why the vehicle is in `Halt`, `None` in any other mode.
    pub halt_cause: Option<HaltCause>,
}

/// Inputs to one cycle of the supervisor.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct CycleInput {
    /// Requested linear velocity, used in `ManualTeleop` and
    /// `ExternalCommand`.
    ///
    /// Units: meters/second
    pub requested_linear_ms: f64,

    /// Requested angular velocity, positive anticlockwise, used in
    /// `ManualTeleop` and `ExternalCommand`.
    ///
    /// Units: radians/second
    pub requested_angular_rads: f64,

    /// Current reading of the safety interlock.
    pub hardware_switch_engaged: bool,

    /// Time of this cycle.
    ///
    /// Units: seconds
    pub now_s: f64,
}

/// Flat telemetry snapshot of the supervisor.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct SupervisorStatus {
    pub time_s: f64,
    pub mode: OperatingMode,
    pub docking_phase: DockingPhase,
    pub watchdog_ok: bool,
    pub hardware_switch_ok: bool,
    pub failsafe_ok: bool,
    pub halt_cause: Option<HaltCause>,
    pub last_command_time_s: Option<f64>,
    pub cmd_linear_ms: f64,
    pub cmd_angular_rads: f64,
}

/// Data needed to initialise the supervisor, the names of its parameter
/// files.
#[derive(Debug, Copy, Clone)]
pub struct SupervisorInitData {
    pub supervisor_params: &'static str,
    pub dock_nav_params: &'static str,
    pub loc_params: &'static str,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The reason the vehicle entered `Halt`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub enum HaltCause {
    Startup,
    Watchdog,
    HardwareSwitch,
    HaltRequest,
    DriveFault,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SupervisorState {
    fn default() -> Self {
        Self {
            current_mode: OperatingMode::Halt,
            last_command_time_s: None,
            failsafe_ok: false,
            halt_cause: Some(HaltCause::Startup),
        }
    }
}

impl Supervisor {
    /// Create a new supervisor in `Halt`.
    pub fn new(
        params: SupervisorParams,
        nav_params: DockNavParams,
        loc_mgr: LocMgr,
        indicator: Box<dyn SafetyIndicator>,
    ) -> Self {
        Self {
            params,
            state: SupervisorState::default(),
            failsafe: FailsafeMonitor::new(params.watchdog_timeout_s, indicator),
            dock_nav: DockNav::new(nav_params),
            loc_mgr,
            manual_map: CmdMapper::new(params.manual),
            external_map: CmdMapper::new(params.external),
            last_eval_time_s: f64::NAN,
            last_output: VelocityCommand::zero(),
            arch_status: Archiver::default(),
        }
    }

    /// Request a change of operating mode.
    ///
    /// Requesting the current mode does nothing. Otherwise:
    /// - `Halt` can be entered from any mode.
    /// - `Sleep` can only be entered from `Halt`.
    /// - Driving modes can only be entered from `Halt` while the vehicle is
    ///   safe to drive, and `AutonomousDock` only once a dock is configured.
    pub fn request_mode(&mut self, new_mode: OperatingMode) -> Result<(), ModeRejected> {
        let from = self.state.current_mode;

        if new_mode == from {
            return Ok(());
        }

        let check = match (from, new_mode) {
            (_, OperatingMode::Halt) => Ok(()),
            (OperatingMode::Halt, OperatingMode::Sleep) => Ok(()),
            (OperatingMode::Halt, OperatingMode::AutonomousDock)
                if !self.dock_nav.is_configured() =>
            {
                Err(ModeRejected::NoDockTarget)
            }
            (OperatingMode::Halt, m) if m.is_driving() => match self.state.failsafe_ok {
                true => Ok(()),
                false => Err(ModeRejected::Unsafe(m)),
            },
            _ => Err(ModeRejected::InvalidTransition { from, to: new_mode }),
        };

        if let Err(e) = check {
            warn!("Mode request rejected: {}", e);
            return Err(e);
        }

        self.set_mode(new_mode, HaltCause::HaltRequest);

        Ok(())
    }

    /// Process one cycle with a newly received command.
    ///
    /// The command's arrival is stamped and the failsafes evaluated against
    /// the previous command's arrival, so the watchdog only passes if the
    /// command stream is fresh. If not safe the vehicle is halted (from any
    /// mode) and zero is returned.
    pub fn process_cycle(&mut self, input: &CycleInput) -> VelocityCommand {
        let prev_cmd_time_s = self.state.last_command_time_s.unwrap_or(input.now_s);
        self.state.last_command_time_s = Some(input.now_s);

        let status = self.evaluate_failsafe(
            input.now_s,
            Some(prev_cmd_time_s),
            input.hardware_switch_engaged,
        );

        let cmd = if !status.safe_to_drive() {
            if self.state.current_mode != OperatingMode::Halt {
                self.force_halt(unsafe_cause(&status));
            }
            VelocityCommand::zero()
        } else {
            match self.state.current_mode {
                OperatingMode::Sleep | OperatingMode::Halt => VelocityCommand::zero(),
                OperatingMode::ManualTeleop => self
                    .manual_map
                    .map(input.requested_linear_ms, input.requested_angular_rads),
                OperatingMode::ExternalCommand => self
                    .external_map
                    .map(input.requested_linear_ms, input.requested_angular_rads),
                OperatingMode::AutonomousDock => self.dock_step(),
            }
        };

        trace!("Supervisor {} output: {:?}", self.state.current_mode, cmd);

        self.last_output = cmd;

        cmd
    }

    /// Evaluate the failsafes without a new command, halting the vehicle from
    /// any mode if it is no longer safe.
    pub fn monitor(&mut self, now_s: f64, hardware_switch_engaged: bool) -> FailsafeStatus {
        let status = self.evaluate_failsafe(
            now_s,
            self.state.last_command_time_s,
            hardware_switch_engaged,
        );

        if !status.safe_to_drive() && self.state.current_mode != OperatingMode::Halt {
            self.force_halt(unsafe_cause(&status));
        }

        if !self.state.current_mode.is_driving() {
            self.last_output = VelocityCommand::zero();
        }

        status
    }

    /// Halt the vehicle for the given reason. Does nothing if already halted.
    pub fn force_halt(&mut self, cause: HaltCause) {
        if self.state.current_mode != OperatingMode::Halt {
            warn!(
                "Forcing HALT from {} ({:?})",
                self.state.current_mode, cause
            );
            self.set_mode(OperatingMode::Halt, cause);
        }
        self.last_output = VelocityCommand::zero();
    }

    /// Set the dock which `AutonomousDock` homes on to.
    pub fn configure_dock_target(&mut self, target: TargetLocation, anchors: AnchorSet) {
        self.loc_mgr.configure(&target, &anchors);
        self.dock_nav.configure(target, anchors);
    }

    /// The configured dock, if any.
    pub fn dock(&self) -> Option<&DockConfig> {
        self.dock_nav.dock()
    }

    pub fn current_mode(&self) -> OperatingMode {
        self.state.current_mode
    }

    pub fn current_docking_phase(&self) -> DockingPhase {
        self.dock_nav.phase()
    }

    pub fn state(&self) -> &SupervisorState {
        &self.state
    }

    /// The command produced by the most recent cycle.
    pub fn last_output(&self) -> VelocityCommand {
        self.last_output
    }

    /// Access the localisation manager, used to pass in new measurements.
    pub fn loc_mgr_mut(&mut self) -> &mut LocMgr {
        &mut self.loc_mgr
    }

    /// The largest command each source of commands can produce: the two
    /// command maps and every docking phase.
    pub fn command_bounds(&self) -> Vec<CommandBounds> {
        let mut bounds = vec![
            CommandBounds {
                name: "manual",
                max_linear_ms: self.params.manual.max_linear_ms,
                max_angular_rads: self.params.manual.max_angular_rads,
            },
            CommandBounds {
                name: "external",
                max_linear_ms: self.params.external.max_linear_ms,
                max_angular_rads: self.params.external.max_angular_rads,
            },
        ];

        let phases = [
            ("coarse docking", DockingPhase::CoarseSatellite),
            ("medium docking", DockingPhase::MediumRanging),
            ("fine docking", DockingPhase::FineBeacon),
        ];
        for (name, phase) in phases.iter() {
            if let Some(p) = self.dock_nav.phase_params(*phase) {
                bounds.push(CommandBounds {
                    name: *name,
                    max_linear_ms: p.max_linear_ms,
                    max_angular_rads: p.max_angular_rads,
                });
            }
        }

        bounds
    }

    pub fn status(&self) -> SupervisorStatus {
        let fs = self.failsafe.last_status().unwrap_or_default();

        SupervisorStatus {
            time_s: self.last_eval_time_s,
            mode: self.state.current_mode,
            docking_phase: self.dock_nav.phase(),
            watchdog_ok: fs.watchdog_ok,
            hardware_switch_ok: fs.hardware_switch_ok,
            failsafe_ok: self.state.failsafe_ok,
            halt_cause: self.state.halt_cause,
            last_command_time_s: self.state.last_command_time_s,
            cmd_linear_ms: self.last_output.linear_ms,
            cmd_angular_rads: self.last_output.angular_rads,
        }
    }

    fn evaluate_failsafe(
        &mut self,
        now_s: f64,
        last_command_time_s: Option<f64>,
        hardware_switch_engaged: bool,
    ) -> FailsafeStatus {
        let status = self
            .failsafe
            .evaluate(now_s, last_command_time_s, hardware_switch_engaged);

        self.state.failsafe_ok = status.safe_to_drive();
        self.last_eval_time_s = now_s;

        status
    }

    fn dock_step(&mut self) -> VelocityCommand {
        let finer_source_ok = self.loc_mgr.is_available(LocSource::Ranging);
        let fix = self.loc_mgr.poll(self.dock_nav.phase().loc_source());

        self.dock_nav.advance(&fix, finer_source_ok)
    }

    fn set_mode(&mut self, new_mode: OperatingMode, halt_cause: HaltCause) {
        let from = self.state.current_mode;

        if from == OperatingMode::AutonomousDock {
            self.dock_nav.stop();
        }
        if new_mode == OperatingMode::AutonomousDock {
            self.dock_nav.start();
        }

        self.state.halt_cause = match new_mode {
            OperatingMode::Halt => Some(halt_cause),
            _ => None,
        };
        self.state.current_mode = new_mode;

        info!("Mode change: {} -> {}", from, new_mode);
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new(
            SupervisorParams::default(),
            DockNavParams::default(),
            LocMgr::default(),
            Box::new(LogIndicator::default()),
        )
    }
}

impl State for Supervisor {
    type InitData = SupervisorInitData;
    type InitError = SupervisorError;

    type InputData = CycleInput;
    type OutputData = VelocityCommand;
    type StatusReport = SupervisorStatus;
    type ProcError = Infallible;

    /// Load the parameters and open the status archive. If the localisation
    /// parameters include a dock target it is configured straight away.
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        let sup_params: SupervisorParams = params::load(init_data.supervisor_params)
            .map_err(|e| SupervisorError::ParamLoadError(init_data.supervisor_params, e))?;
        let nav_params: DockNavParams = params::load(init_data.dock_nav_params)
            .map_err(|e| SupervisorError::ParamLoadError(init_data.dock_nav_params, e))?;
        let loc_params: LocParams = params::load(init_data.loc_params)
            .map_err(|e| SupervisorError::ParamLoadError(init_data.loc_params, e))?;

        *self = Self::new(
            sup_params,
            nav_params,
            LocMgr::new(&loc_params),
            Box::new(LogIndicator::default()),
        );

        if let Some(target) = loc_params.target {
            self.configure_dock_target(target, loc_params.anchors.clone());
        }

        self.arch_status = Archiver::from_path(session, "supervisor/status.csv")
            .map_err(SupervisorError::ArchiveError)?;

        Ok(())
    }

    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let cmd = self.process_cycle(input_data);
        Ok((cmd, self.status()))
    }

    fn make_safe(&mut self) {
        self.force_halt(HaltCause::HaltRequest);
    }
}

impl Archived for Supervisor {
    fn write(&mut self) -> Result<(), ArchiveError> {
        let status = self.status();
        self.arch_status.serialise(status)
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("state", &self.state)
            .field("docking_phase", &self.dock_nav.phase())
            .field("last_output", &self.last_output)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// The halt cause for an unsafe failsafe verdict. The watchdog takes
/// priority if both have failed.
fn unsafe_cause(status: &FailsafeStatus) -> HaltCause {
    match status.watchdog_ok {
        false => HaltCause::Watchdog,
        true => HaltCause::HardwareSwitch,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::drive_client::{check_bounds, DriveParams};
    use crate::failsafe::test::RecordingIndicator;
    use crate::loc::LocalizationProvider;
    use comms_if::eqpt::loc::{
        LocalizationFix, Measurement, RangingMeasurement, SatelliteMeasurement,
    };
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_8, PI};
    use std::rc::Rc;

    /// Provider whose next fixes are set by the test.
    struct FakeProvider {
        source: LocSource,
        fixes: Rc<RefCell<Vec<LocalizationFix>>>,
        available: bool,
    }

    impl LocalizationProvider for FakeProvider {
        fn source(&self) -> LocSource {
            self.source
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn poll(&mut self) -> LocalizationFix {
            let mut fixes = self.fixes.borrow_mut();
            if fixes.is_empty() {
                LocalizationFix::invalid()
            } else {
                fixes.remove(0)
            }
        }
    }

    /// Fix queues for the satellite, ranging and beacon sources
    struct Fixes {
        sat: Rc<RefCell<Vec<LocalizationFix>>>,
        rng: Rc<RefCell<Vec<LocalizationFix>>>,
        bcn: Rc<RefCell<Vec<LocalizationFix>>>,
    }

    fn supervisor() -> (Supervisor, Fixes, RecordingIndicator) {
        let fixes = Fixes {
            sat: Rc::default(),
            rng: Rc::default(),
            bcn: Rc::default(),
        };
        let provider = |source, fixes: &Rc<RefCell<Vec<LocalizationFix>>>| {
            Box::new(FakeProvider {
                source,
                fixes: fixes.clone(),
                available: true,
            }) as Box<dyn LocalizationProvider>
        };
        let loc_mgr = LocMgr::with_providers(vec![
            provider(LocSource::Satellite, &fixes.sat),
            provider(LocSource::Ranging, &fixes.rng),
            provider(LocSource::Beacon, &fixes.bcn),
        ]);
        let indicator = RecordingIndicator::default();

        let sup = Supervisor::new(
            SupervisorParams::default(),
            DockNavParams::default(),
            loc_mgr,
            Box::new(indicator.clone()),
        );

        (sup, fixes, indicator)
    }

    fn input(now_s: f64, linear_ms: f64, angular_rads: f64) -> CycleInput {
        CycleInput {
            requested_linear_ms: linear_ms,
            requested_angular_rads: angular_rads,
            hardware_switch_engaged: true,
            now_s,
        }
    }

    /// Run one safe cycle then enter `mode`
    fn enter(sup: &mut Supervisor, now_s: f64, mode: OperatingMode) {
        sup.process_cycle(&input(now_s, 0.0, 0.0));
        sup.request_mode(mode).unwrap();
    }

    fn configure(sup: &mut Supervisor) {
        sup.configure_dock_target(
            TargetLocation {
                latitude_deg: 52.0,
                longitude_deg: -1.0,
            },
            AnchorSet::default(),
        );
    }

    #[test]
    fn test_startup() {
        let (mut sup, _, _) = supervisor();

        assert_eq!(sup.current_mode(), OperatingMode::Halt);
        assert_eq!(sup.current_docking_phase(), DockingPhase::Disabled);
        assert_eq!(sup.state().halt_cause, Some(HaltCause::Startup));
        assert!(!sup.state().failsafe_ok);

        // No safe cycle yet so no driving
        assert_eq!(
            sup.request_mode(OperatingMode::ManualTeleop),
            Err(ModeRejected::Unsafe(OperatingMode::ManualTeleop))
        );
        assert_eq!(sup.current_mode(), OperatingMode::Halt);

        // The first command counts as fresh
        sup.process_cycle(&input(5.0, 0.0, 0.0));
        assert!(sup.state().failsafe_ok);
        assert_eq!(sup.request_mode(OperatingMode::ManualTeleop), Ok(()));
        assert_eq!(sup.state().halt_cause, None);
    }

    #[test]
    fn test_fresh_manual_command() {
        let (mut sup, _, _) = supervisor();
        enter(&mut sup, 1.0, OperatingMode::ManualTeleop);

        let cmd = sup.process_cycle(&input(1.01, 0.3, 0.0));

        assert_eq!(cmd, VelocityCommand::new(0.3, 0.0));
        assert_eq!(sup.current_mode(), OperatingMode::ManualTeleop);

        // Saturated to the manual limits
        let cmd = sup.process_cycle(&input(1.02, 5.0, -5.0));
        assert_eq!(cmd, VelocityCommand::new(1.0, -1.5));
    }

    #[test]
    fn test_stale_external_command() {
        let (mut sup, _, _) = supervisor();
        enter(&mut sup, 1.0, OperatingMode::ExternalCommand);

        assert_eq!(
            sup.process_cycle(&input(1.1, 0.5, 0.2)),
            VelocityCommand::new(0.5, 0.2)
        );

        let cmd = sup.process_cycle(&input(1.4, 0.5, 0.2));

        assert!(cmd.is_zero());
        assert_eq!(sup.current_mode(), OperatingMode::Halt);
        assert_eq!(sup.state().halt_cause, Some(HaltCause::Watchdog));

        // Staying halted even once the commands are fresh again
        assert!(sup.process_cycle(&input(1.45, 0.5, 0.2)).is_zero());
        assert_eq!(sup.current_mode(), OperatingMode::Halt);
    }

    #[test]
    fn test_switch_disengaged() {
        let (mut sup, _, indicator) = supervisor();
        enter(&mut sup, 1.0, OperatingMode::ManualTeleop);

        let mut inp = input(1.05, 0.3, 0.0);
        inp.hardware_switch_engaged = false;
        assert!(sup.process_cycle(&inp).is_zero());
        assert_eq!(sup.current_mode(), OperatingMode::Halt);
        assert_eq!(sup.state().halt_cause, Some(HaltCause::HardwareSwitch));

        assert_eq!(*indicator.0.borrow(), vec![true, false]);

        // Can't drive again until the switch is engaged
        assert!(sup.request_mode(OperatingMode::ManualTeleop).is_err());
        sup.process_cycle(&input(1.1, 0.0, 0.0));
        assert!(sup.request_mode(OperatingMode::ManualTeleop).is_ok());
    }

    #[test]
    fn test_unsafe_always_halts() {
        let modes = [
            OperatingMode::Sleep,
            OperatingMode::ManualTeleop,
            OperatingMode::ExternalCommand,
            OperatingMode::AutonomousDock,
        ];

        for mode in modes.iter() {
            let (mut sup, _, _) = supervisor();
            configure(&mut sup);
            enter(&mut sup, 0.0, *mode);

            let mut inp = input(0.1, 0.4, 0.4);
            inp.hardware_switch_engaged = false;

            assert!(sup.process_cycle(&inp).is_zero());
            assert_eq!(sup.current_mode(), OperatingMode::Halt);
            assert_eq!(sup.current_docking_phase(), DockingPhase::Disabled);
        }
    }

    #[test]
    fn test_monitor() {
        let (mut sup, _, _) = supervisor();

        // No command yet
        assert!(!sup.monitor(0.0, true).watchdog_ok);

        enter(&mut sup, 1.0, OperatingMode::ManualTeleop);
        sup.process_cycle(&input(1.05, 0.3, 0.0));

        assert!(sup.monitor(1.1, true).safe_to_drive());
        assert_eq!(sup.current_mode(), OperatingMode::ManualTeleop);
        assert_eq!(sup.last_output(), VelocityCommand::new(0.3, 0.0));

        // Command stream stops
        assert!(!sup.monitor(1.3, true).watchdog_ok);
        assert_eq!(sup.current_mode(), OperatingMode::Halt);
        assert!(sup.last_output().is_zero());
    }

    #[test]
    fn test_monitor_halts_sleep() {
        let (mut sup, _, _) = supervisor();
        enter(&mut sup, 1.0, OperatingMode::Sleep);

        let status = sup.monitor(5.0, false);
        assert!(!status.safe_to_drive());
        assert!(!sup.state().failsafe_ok);
        assert_eq!(sup.current_mode(), OperatingMode::Halt);
        assert_eq!(sup.state().halt_cause, Some(HaltCause::Watchdog));

        // Same outcome with a fresh command stream and the switch released
        let (mut sup, _, _) = supervisor();
        enter(&mut sup, 1.0, OperatingMode::Sleep);
        sup.monitor(1.1, false);
        assert_eq!(sup.current_mode(), OperatingMode::Halt);
        assert_eq!(sup.state().halt_cause, Some(HaltCause::HardwareSwitch));
    }

    #[test]
    fn test_dock_needs_target() {
        let (mut sup, _, _) = supervisor();
        sup.process_cycle(&input(0.0, 0.0, 0.0));

        assert_eq!(
            sup.request_mode(OperatingMode::AutonomousDock),
            Err(ModeRejected::NoDockTarget)
        );
        assert_eq!(sup.current_mode(), OperatingMode::Halt);
        assert_eq!(sup.current_docking_phase(), DockingPhase::Disabled);

        configure(&mut sup);
        assert_eq!(sup.request_mode(OperatingMode::AutonomousDock), Ok(()));
        assert_eq!(sup.current_docking_phase(), DockingPhase::CoarseSatellite);
    }

    #[test]
    fn test_transitions() {
        let (mut sup, _, _) = supervisor();
        sup.process_cycle(&input(0.0, 0.0, 0.0));

        // Driving modes only via Halt
        sup.request_mode(OperatingMode::ManualTeleop).unwrap();
        assert_eq!(
            sup.request_mode(OperatingMode::ExternalCommand),
            Err(ModeRejected::InvalidTransition {
                from: OperatingMode::ManualTeleop,
                to: OperatingMode::ExternalCommand
            })
        );
        assert_eq!(
            sup.request_mode(OperatingMode::Sleep),
            Err(ModeRejected::InvalidTransition {
                from: OperatingMode::ManualTeleop,
                to: OperatingMode::Sleep
            })
        );
        assert_eq!(sup.current_mode(), OperatingMode::ManualTeleop);

        sup.request_mode(OperatingMode::Halt).unwrap();
        assert_eq!(sup.state().halt_cause, Some(HaltCause::HaltRequest));

        // Sleep only leaves to Halt
        sup.request_mode(OperatingMode::Sleep).unwrap();
        assert!(sup.request_mode(OperatingMode::ManualTeleop).is_err());
        assert_eq!(sup.current_mode(), OperatingMode::Sleep);
        sup.request_mode(OperatingMode::Halt).unwrap();
        assert_eq!(sup.current_mode(), OperatingMode::Halt);
    }

    #[test]
    fn test_idempotent_request() {
        let (mut sup, fixes, _) = supervisor();
        configure(&mut sup);
        enter(&mut sup, 0.0, OperatingMode::AutonomousDock);

        fixes.sat.borrow_mut().push(LocalizationFix::new(8.0, 0.0));
        sup.process_cycle(&input(0.1, 0.0, 0.0));
        assert_eq!(sup.current_docking_phase(), DockingPhase::MediumRanging);

        assert_eq!(sup.request_mode(OperatingMode::AutonomousDock), Ok(()));
        assert_eq!(sup.current_docking_phase(), DockingPhase::MediumRanging);

        // Halt is also a no-op when halted, keeping the first cause
        sup.force_halt(HaltCause::DriveFault);
        assert_eq!(sup.request_mode(OperatingMode::Halt), Ok(()));
        assert_eq!(sup.state().halt_cause, Some(HaltCause::DriveFault));
    }

    #[test]
    fn test_dock_exit_resets_phase() {
        let (mut sup, fixes, _) = supervisor();
        configure(&mut sup);
        enter(&mut sup, 0.0, OperatingMode::AutonomousDock);

        fixes.sat.borrow_mut().push(LocalizationFix::new(8.0, 0.0));
        sup.process_cycle(&input(0.1, 0.0, 0.0));
        assert_eq!(sup.current_docking_phase(), DockingPhase::MediumRanging);

        sup.request_mode(OperatingMode::Halt).unwrap();
        assert_eq!(sup.current_docking_phase(), DockingPhase::Disabled);

        // Re-entering starts again from the satellite phase
        sup.process_cycle(&input(0.2, 0.0, 0.0));
        sup.request_mode(OperatingMode::AutonomousDock).unwrap();
        assert_eq!(sup.current_docking_phase(), DockingPhase::CoarseSatellite);
    }

    #[test]
    fn test_coarse_phase_threshold() {
        let (mut sup, fixes, _) = supervisor();
        configure(&mut sup);
        enter(&mut sup, 0.0, OperatingMode::AutonomousDock);

        fixes.sat.borrow_mut().push(LocalizationFix::new(12.0, 0.1));
        let cmd = sup.process_cycle(&input(0.1, 0.0, 0.0));
        assert_eq!(sup.current_docking_phase(), DockingPhase::CoarseSatellite);
        assert_eq!(cmd.linear_ms, 0.4);
        assert!((cmd.angular_rads - 0.3 * 0.1).abs() < 1e-12);

        fixes.sat.borrow_mut().push(LocalizationFix::new(8.0, 0.1));
        sup.process_cycle(&input(0.2, 0.0, 0.0));
        assert_eq!(sup.current_docking_phase(), DockingPhase::MediumRanging);
    }

    #[test]
    fn test_coarse_waits_for_ranging() {
        let mut sup = Supervisor::new(
            SupervisorParams::default(),
            DockNavParams::default(),
            LocMgr::new(&LocParams::default()),
            Box::new(LogIndicator::default()),
        );
        configure(&mut sup);
        enter(&mut sup, 0.0, OperatingMode::AutonomousDock);

        // 8 m north of the dock heading south towards it
        let m_per_deg = crate::loc::EARTH_RADIUS_M * PI / 180.0;
        let sat = Measurement::Satellite(SatelliteMeasurement {
            latitude_deg: 52.0 + 8.0 / m_per_deg,
            longitude_deg: -1.0,
            course_rad: PI,
            num_satellites: 8,
        });

        // Inside the coarse threshold but the anchors aren't answering
        let mut t = 0.0;
        for _ in 0..5 {
            t += 0.1;
            sup.loc_mgr_mut().set_measurement(&sat);
            let cmd = sup.process_cycle(&input(t, 0.0, 0.0));
            assert_eq!(sup.current_docking_phase(), DockingPhase::CoarseSatellite);
            assert_eq!(cmd.linear_ms, 0.4);
        }

        let ranges_m: HashMap<u16, f64> = AnchorSet::default()
            .anchors
            .iter()
            .map(|a| (a.network_id, a.position_m[0].hypot(a.position_m[1] - 8.0)))
            .collect();
        sup.loc_mgr_mut().set_measurement(&sat);
        sup.loc_mgr_mut()
            .set_measurement(&Measurement::Ranging(RangingMeasurement {
                ranges_m,
                heading_rad: -FRAC_PI_2,
            }));
        sup.process_cycle(&input(t + 0.1, 0.0, 0.0));
        assert_eq!(sup.current_docking_phase(), DockingPhase::MediumRanging);
    }

    #[test]
    fn test_full_dock() {
        let (mut sup, fixes, _) = supervisor();
        configure(&mut sup);
        enter(&mut sup, 0.0, OperatingMode::AutonomousDock);

        fixes.sat.borrow_mut().push(LocalizationFix::new(9.0, 0.0));
        fixes.rng.borrow_mut().extend(vec![
            LocalizationFix::new(5.0, 0.2),
            LocalizationFix::invalid(),
            LocalizationFix::new(2.5, 0.0),
        ]);
        fixes.bcn.borrow_mut().extend(vec![
            LocalizationFix::new(0.5, 0.5),
            LocalizationFix::new(0.4, 0.1),
            LocalizationFix::new(0.05, 0.0),
        ]);

        let mut phases = vec![];
        let mut t = 0.0;
        for _ in 0..8 {
            t += 0.1;
            let cmd = sup.process_cycle(&input(t, 0.0, 0.0));
            let phase = sup.current_docking_phase();

            // Linear speed is always within the limit of the fine phase or
            // the coarser ones
            assert!(cmd.linear_ms.abs() <= 0.4);
            if phase == DockingPhase::Homed {
                assert!(cmd.is_zero());
            }

            phases.push(phase);
        }

        // Never goes backwards
        assert!(phases.windows(2).all(|w| w[0].ordinal() <= w[1].ordinal()));
        assert_eq!(phases.last(), Some(&DockingPhase::Homed));
        assert_eq!(sup.current_mode(), OperatingMode::AutonomousDock);
    }

    #[test]
    fn test_fine_phase_alignment() {
        let (mut sup, fixes, _) = supervisor();
        configure(&mut sup);
        enter(&mut sup, 0.0, OperatingMode::AutonomousDock);

        fixes.sat.borrow_mut().push(LocalizationFix::new(9.0, 0.0));
        fixes.rng.borrow_mut().push(LocalizationFix::new(2.0, 0.0));
        sup.process_cycle(&input(0.1, 0.0, 0.0));
        sup.process_cycle(&input(0.2, 0.0, 0.0));
        assert_eq!(sup.current_docking_phase(), DockingPhase::FineBeacon);

        let k_angular = sup.dock_nav.params.fine.k_angular;

        fixes.bcn.borrow_mut().push(LocalizationFix::new(0.5, 0.5));
        let cmd = sup.process_cycle(&input(0.3, 0.0, 0.0));
        assert_eq!(cmd.linear_ms, 0.0);
        assert!((cmd.angular_rads - k_angular * 0.5).abs() < 1e-12);

        fixes.bcn.borrow_mut().push(LocalizationFix::new(0.5, FRAC_PI_8));
        assert_eq!(sup.process_cycle(&input(0.4, 0.0, 0.0)).linear_ms, 0.0);

        fixes.bcn.borrow_mut().push(LocalizationFix::new(0.5, 0.1));
        let cmd = sup.process_cycle(&input(0.5, 0.0, 0.0));
        assert!(cmd.linear_ms > 0.0 && cmd.linear_ms <= 0.25);
    }

    #[test]
    fn test_command_bounds() {
        let (sup, _, _) = supervisor();

        let bounds = sup.command_bounds();
        let names: Vec<_> = bounds.iter().map(|b| b.name).collect();
        assert_eq!(
            names,
            vec!["manual", "external", "coarse docking", "medium docking", "fine docking"]
        );
        assert_eq!(bounds[0].max_linear_ms, 1.0);
        assert_eq!(bounds[4].max_linear_ms, 0.25);

        // The default limits can all be driven by the default drivetrain
        assert!(check_bounds(&DriveParams::default(), &bounds).is_ok());

        let weak = DriveParams {
            max_wheel_rate_rads: 10.0,
            ..DriveParams::default()
        };
        assert!(check_bounds(&weak, &bounds).is_err());
    }

    #[test]
    fn test_force_halt() {
        let (mut sup, _, _) = supervisor();
        enter(&mut sup, 0.0, OperatingMode::ManualTeleop);
        sup.process_cycle(&input(0.1, 0.3, 0.0));

        sup.force_halt(HaltCause::DriveFault);
        assert_eq!(sup.current_mode(), OperatingMode::Halt);
        assert_eq!(sup.state().halt_cause, Some(HaltCause::DriveFault));
        assert!(sup.last_output().is_zero());
    }

    #[test]
    fn test_status() {
        let (mut sup, _, _) = supervisor();
        enter(&mut sup, 2.0, OperatingMode::ManualTeleop);
        sup.process_cycle(&input(2.1, 0.3, -0.2));

        let status = sup.status();
        assert_eq!(status.time_s, 2.1);
        assert_eq!(status.mode, OperatingMode::ManualTeleop);
        assert_eq!(status.docking_phase, DockingPhase::Disabled);
        assert!(status.watchdog_ok && status.hardware_switch_ok && status.failsafe_ok);
        assert_eq!(status.halt_cause, None);
        assert_eq!(status.last_command_time_s, Some(2.1));
        assert_eq!(status.cmd_linear_ms, 0.3);
        assert_eq!(status.cmd_angular_rads, -0.2);
    }

    #[test]
    fn test_state_proc() {
        let (mut sup, _, _) = supervisor();
        enter(&mut sup, 0.0, OperatingMode::ExternalCommand);

        let (cmd, status) = match sup.proc(&input(0.1, 0.2, 0.0)) {
            Ok(r) => r,
            Err(e) => match e {},
        };
        assert_eq!(cmd, VelocityCommand::new(0.2, 0.0));
        assert_eq!(status.mode, OperatingMode::ExternalCommand);

        sup.make_safe();
        assert_eq!(sup.current_mode(), OperatingMode::Halt);
    }
}
