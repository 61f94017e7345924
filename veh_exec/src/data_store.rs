//! # Data Store

use log::{error, warn};

use crate::{
    drive_client::DriveClientError,
    supervisor::{CycleInput, HaltCause, Supervisor},
};
use comms_if::{
    eqpt::drive::{DriveDemsResponse, VelocityCommand},
    tc::mode::OperatingMode,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default, Debug)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    // Supervisor
    pub supervisor: Supervisor,

    /// The command received this cycle, if any. Only the most recent command
    /// of a cycle is kept.
    pub cmd: Option<VelocityCommand>,

    /// Latest state of the safety interlock switch
    pub hardware_switch_engaged: bool,

    /// The command sent to the drivetrain this cycle
    pub output: VelocityCommand,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of consecutive failures to send demands to the drivetrain
    pub num_consec_drive_failures: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        let cycles_per_s = (cycle_frequency_hz.round() as u128).max(1);
        self.is_1_hz_cycle = self.num_cycles % cycles_per_s == 0;

        self.cmd = None;
    }

    /// Run the supervisor for this cycle.
    ///
    /// The supervisor processes a full cycle if a command arrived or the
    /// vehicle is docking, in which case the navigator is its own command
    /// source. Otherwise only the failsafes are checked and the previous
    /// output is held, so a command stream which stops expires the watchdog.
    pub fn supervisor_cycle(&mut self, now_s: f64) -> VelocityCommand {
        let docking = self.supervisor.current_mode() == OperatingMode::AutonomousDock;

        self.output = match (self.cmd, docking) {
            (Some(cmd), _) => self.supervisor.process_cycle(&CycleInput {
                requested_linear_ms: cmd.linear_ms,
                requested_angular_rads: cmd.angular_rads,
                hardware_switch_engaged: self.hardware_switch_engaged,
                now_s,
            }),
            (None, true) => self.supervisor.process_cycle(&CycleInput {
                hardware_switch_engaged: self.hardware_switch_engaged,
                now_s,
                ..Default::default()
            }),
            (None, false) => {
                self.supervisor.monitor(now_s, self.hardware_switch_engaged);
                self.supervisor.last_output()
            }
        };

        self.output
    }

    /// Handle the result of sending this cycle's demands to the drivetrain,
    /// halting the vehicle once more than `max_failures` consecutive sends
    /// have failed.
    pub fn drive_result(
        &mut self,
        result: Result<DriveDemsResponse, DriveClientError>,
        max_failures: u64,
    ) {
        match result {
            Ok(DriveDemsResponse::DemsOk) => {
                self.num_consec_drive_failures = 0;
                return;
            }
            Ok(r) => warn!("Non-nominal response from the drivetrain: {:?}", r),
            Err(e) => warn!("Could not send demands to the drivetrain: {}", e),
        }

        self.num_consec_drive_failures += 1;

        if self.num_consec_drive_failures > max_failures
            && self.supervisor.current_mode() != OperatingMode::Halt
        {
            error!(
                "Maximum number of consecutive drive failures ({}) exceeded",
                max_failures
            );
            self.supervisor.force_halt(HaltCause::DriveFault);
            self.output = VelocityCommand::zero();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ready_store(mode: OperatingMode) -> DataStore {
        let mut ds = DataStore {
            hardware_switch_engaged: true,
            cmd: Some(VelocityCommand::zero()),
            ..Default::default()
        };
        ds.supervisor_cycle(0.0);
        ds.supervisor.request_mode(mode).unwrap();
        ds
    }

    #[test]
    fn test_1_hz_flag() {
        let mut ds = DataStore::default();
        let mut flags = vec![];

        for _ in 0..21 {
            ds.cycle_start(10.0);
            flags.push(ds.is_1_hz_cycle);
            ds.num_cycles += 1;
        }

        assert_eq!(flags.iter().filter(|f| **f).count(), 3);
        assert!(flags[0] && flags[10] && flags[20]);
    }

    #[test]
    fn test_command_held_until_watchdog() {
        let mut ds = ready_store(OperatingMode::ManualTeleop);

        ds.cycle_start(10.0);
        ds.cmd = Some(VelocityCommand::new(0.3, 0.1));
        assert_eq!(ds.supervisor_cycle(0.1), VelocityCommand::new(0.3, 0.1));

        // No new command, the last one is held while the watchdog is fresh
        ds.cycle_start(10.0);
        assert_eq!(ds.supervisor_cycle(0.2), VelocityCommand::new(0.3, 0.1));

        ds.cycle_start(10.0);
        assert!(ds.supervisor_cycle(0.4).is_zero());
        assert_eq!(ds.supervisor.current_mode(), OperatingMode::Halt);
    }

    #[test]
    fn test_drive_failures() {
        let mut ds = ready_store(OperatingMode::ExternalCommand);

        for _ in 0..3 {
            ds.drive_result(Err(DriveClientError::NotConnected), 3);
        }
        assert_eq!(ds.supervisor.current_mode(), OperatingMode::ExternalCommand);

        // A good send resets the count
        ds.drive_result(Ok(DriveDemsResponse::DemsOk), 3);
        assert_eq!(ds.num_consec_drive_failures, 0);

        for _ in 0..3 {
            ds.drive_result(Ok(DriveDemsResponse::EqptInvalid), 3);
        }
        assert_eq!(ds.supervisor.current_mode(), OperatingMode::ExternalCommand);

        ds.drive_result(Err(DriveClientError::EqptFault("stall".into())), 3);
        assert_eq!(ds.supervisor.current_mode(), OperatingMode::Halt);
        assert_eq!(
            ds.supervisor.state().halt_cause,
            Some(HaltCause::DriveFault)
        );
        assert!(ds.output.is_zero());
    }
}
