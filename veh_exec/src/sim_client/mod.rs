//! # Simulation Client
//!
//! Provides a simulated vehicle for testing and development of the docking software without the
//! real drivetrain and sensors. The simulated vehicle:
//!
//! - Accepts drive demands in place of the drive equipment.
//! - Integrates its pose in the dock frame with unicycle kinematics.
//! - Synthesises satellite, ranging and beacon measurements from its pose.
//!
//! The dock sits at the origin of the dock frame, with X+ pointing east and Y+ pointing north
//! (out of the dock mouth).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;

pub use params::SimParams;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace};
use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, PI};

use crate::{
    dock_nav::DockConfig,
    drive_client::{DriveClientError, DriveInterface, DriveParams},
};
use comms_if::eqpt::{
    drive::{ActId, DriveDems, DriveDemsResponse},
    loc::{
        BeaconMeasurement, BeaconReceiver, Measurement, RangingMeasurement,
        SatelliteMeasurement, NUM_BEACON_RECEIVERS,
    },
};
use util::maths::{rem_euclid, wrap_pi};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Meters per degree of latitude, matching the Earth radius used by the
/// satellite provider.
const M_PER_DEG_LAT: f64 = crate::loc::EARTH_RADIUS_M * PI / 180.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Pose of the simulated vehicle in the dock frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SimPose {
    /// Units: meters
    pub position_m: [f64; 2],

    /// Anticlockwise from X+.
    ///
    /// Units: radians
    pub heading_rad: f64,
}

/// The simulated vehicle.
#[derive(Debug)]
pub struct SimVehicle {
    params: SimParams,

    drive: DriveParams,

    pose: SimPose,

    /// Wheel speeds from the last accepted demands
    ///
    /// Units: radians/second
    wheel_rates_rads: [f64; 2],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimPose {
    /// Distance from the dock.
    pub fn distance_m(&self) -> f64 {
        self.position_m[0].hypot(self.position_m[1])
    }
}

impl SimVehicle {
    pub fn new(params: SimParams, drive: DriveParams) -> Self {
        Self {
            params,
            drive,
            pose: SimPose {
                position_m: params.initial_position_m,
                heading_rad: params.initial_heading_rad,
            },
            wheel_rates_rads: [0.0; 2],
        }
    }

    pub fn pose(&self) -> SimPose {
        self.pose
    }

    /// Advance the simulation by `dt_s` seconds at the current wheel speeds.
    pub fn step(&mut self, dt_s: f64) {
        if !(dt_s.is_finite() && dt_s > 0.0) {
            return;
        }

        let [left, right] = self.wheel_rates_rads;
        let r = self.drive.wheel_radius_m;

        let linear_ms = r * (left + right) / 2.0;
        let angular_rads = r * (right - left) / self.drive.track_width_m;

        let h = self.pose.heading_rad;
        self.pose.position_m[0] += linear_ms * h.cos() * dt_s;
        self.pose.position_m[1] += linear_ms * h.sin() * dt_s;
        self.pose.heading_rad = wrap_pi(h + angular_rads * dt_s);

        trace!(
            "Sim pose: ({:.3}, {:.3}) m, {:.3} rad",
            self.pose.position_m[0],
            self.pose.position_m[1],
            self.pose.heading_rad
        );
    }

    /// Measurements the vehicle's sensors would make at the current pose.
    ///
    /// A satellite measurement is always produced. Ranging is produced if
    /// any anchor is in range and the beacon only if the dock is in range.
    pub fn measurements(&self, dock: &DockConfig) -> Vec<Measurement> {
        let mut meas = vec![Measurement::Satellite(self.satellite(dock))];

        if let Some(m) = self.ranging(dock) {
            meas.push(Measurement::Ranging(m));
        }

        if let Some(m) = self.beacon() {
            meas.push(Measurement::Beacon(m));
        }

        meas
    }

    fn satellite(&self, dock: &DockConfig) -> SatelliteMeasurement {
        let [x, y] = self.pose.position_m;
        let latitude_deg = dock.target.latitude_deg + y / M_PER_DEG_LAT;
        let m_per_deg_lon = M_PER_DEG_LAT * latitude_deg.to_radians().cos();

        SatelliteMeasurement {
            latitude_deg,
            longitude_deg: dock.target.longitude_deg + x / m_per_deg_lon,
            course_rad: rem_euclid(FRAC_PI_2 - self.pose.heading_rad, 2.0 * PI),
            num_satellites: self.params.num_satellites,
        }
    }

    fn ranging(&self, dock: &DockConfig) -> Option<RangingMeasurement> {
        let [x, y] = self.pose.position_m;

        let ranges_m: HashMap<u16, f64> = dock
            .anchors
            .anchors
            .iter()
            .map(|a| (a.network_id, (a.position_m[0] - x).hypot(a.position_m[1] - y)))
            .filter(|(_, r)| *r <= self.params.ranging_max_range_m)
            .collect();

        if ranges_m.is_empty() {
            return None;
        }

        Some(RangingMeasurement {
            ranges_m,
            heading_rad: self.pose.heading_rad,
        })
    }

    fn beacon(&self) -> Option<BeaconMeasurement> {
        let dist_m = self.pose.distance_m();
        if dist_m > self.params.beacon_max_range_m {
            return None;
        }

        let [x, y] = self.pose.position_m;
        let rel_bearing_rad = wrap_pi((-y).atan2(-x) - self.pose.heading_rad);

        let mut seen = [false; NUM_BEACON_RECEIVERS];
        for rx in BeaconReceiver::ALL.iter() {
            let centre = self.params.beacon_receiver_bearing_rad[rx.index()];
            seen[rx.index()] =
                wrap_pi(rel_bearing_rad - centre).abs() <= self.params.beacon_half_fov_rad;
        }

        Some(BeaconMeasurement {
            seen,
            range_m: Some(dist_m),
        })
    }
}

impl DriveInterface for SimVehicle {
    fn send_demands(&mut self, demands: &DriveDems) -> Result<DriveDemsResponse, DriveClientError> {
        let left = demands.speed_rads.get(&ActId::DrvLeft).copied();
        let right = demands.speed_rads.get(&ActId::DrvRight).copied();

        match (left, right) {
            (Some(l), Some(r)) if l.is_finite() && r.is_finite() => {
                self.wheel_rates_rads = [l, r];
                Ok(DriveDemsResponse::DemsOk)
            }
            _ => {
                for act in [ActId::DrvLeft, ActId::DrvRight].iter() {
                    match demands.speed_rads.get(act) {
                        Some(d) if d.is_finite() => (),
                        d => debug!("Sim rejected demand for {}: {:?}", act.label(), d),
                    }
                }
                Ok(DriveDemsResponse::DemsInvalid)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        dock_nav::{DockNavParams, DockingPhase},
        drive_client::DiffDrive,
        failsafe::LogIndicator,
        loc::{LocMgr, LocParams},
        supervisor::{CycleInput, Supervisor, SupervisorParams},
    };
    use comms_if::{
        eqpt::{
            drive::VelocityCommand,
            loc::{AnchorSet, LocSource, TargetLocation},
        },
        tc::mode::OperatingMode,
    };

    fn dock() -> DockConfig {
        DockConfig {
            target: TargetLocation {
                latitude_deg: 52.0,
                longitude_deg: -1.0,
            },
            anchors: AnchorSet::default(),
        }
    }

    fn vehicle(position_m: [f64; 2], heading_rad: f64) -> SimVehicle {
        SimVehicle::new(
            SimParams {
                initial_position_m: position_m,
                initial_heading_rad: heading_rad,
                ..Default::default()
            },
            DriveParams::default(),
        )
    }

    #[test]
    fn test_kinematics() {
        let mut client = DiffDrive::new(DriveParams::default(), vehicle([0.0, 0.0], 0.0));

        client.send(&VelocityCommand::new(0.5, 0.0)).unwrap();
        client.iface_mut().step(2.0);
        let pose = client.iface().pose();
        assert!((pose.position_m[0] - 1.0).abs() < 1e-9);
        assert!(pose.position_m[1].abs() < 1e-9);

        client.send(&VelocityCommand::new(0.0, 0.5)).unwrap();
        client.iface_mut().step(1.0);
        let pose = client.iface().pose();
        assert!((pose.heading_rad - 0.5).abs() < 1e-9);
        assert!((pose.position_m[0] - 1.0).abs() < 1e-9);

        // Bad demands are refused and the wheels keep their speeds
        let mut dems = DriveDems::default();
        dems.speed_rads.insert(ActId::DrvLeft, f64::NAN);
        assert_eq!(
            client.iface_mut().send_demands(&dems).unwrap(),
            DriveDemsResponse::DemsInvalid
        );
    }

    #[test]
    fn test_measurements() {
        let dock = dock();
        let mut mgr = LocMgr::new(&LocParams::default());
        mgr.configure(&dock.target, &dock.anchors);

        // Far away only satellite is available
        let sim = vehicle([40.0, 40.0], 0.0);
        let meas = sim.measurements(&dock);
        assert_eq!(meas.len(), 1);
        assert_eq!(meas[0].source(), LocSource::Satellite);

        // At 2 m in front of the dock, facing it, everything agrees
        let sim = vehicle([0.0, 2.0], -FRAC_PI_2);
        let meas = sim.measurements(&dock);
        assert_eq!(meas.len(), 3);

        for source in [LocSource::Satellite, LocSource::Ranging, LocSource::Beacon].iter() {
            for m in meas.iter() {
                mgr.set_measurement(m);
            }
            let fix = mgr.poll(Some(*source));
            assert!(fix.valid, "{:?} fix not valid", source);
            assert!((fix.distance_to_target_m - 2.0).abs() < 1e-3);
            assert!(fix.heading_error_rad.abs() < 1e-3);
        }

        // Beacon behind the vehicle
        let sim = vehicle([0.0, 2.0], FRAC_PI_2);
        match sim.beacon() {
            Some(m) => assert_eq!(m.seen, [false, false, false, true]),
            None => panic!("Beacon should be in range"),
        }
    }

    #[test]
    fn test_satellite_heading_sign() {
        let dock = dock();
        let mut mgr = LocMgr::new(&LocParams::default());
        mgr.configure(&dock.target, &dock.anchors);

        // South of the dock facing east, the dock is to the left
        let sim = vehicle([0.0, -20.0], 0.0);
        for m in sim.measurements(&dock).iter() {
            mgr.set_measurement(m);
        }
        let fix = mgr.poll(Some(LocSource::Satellite));
        assert!((fix.heading_error_rad - FRAC_PI_2).abs() < 1e-3);
    }

    #[test]
    fn test_dock_end_to_end() {
        let dock = dock();
        let drive = DriveParams::default();
        let mut client = DiffDrive::new(drive, vehicle([1.0, 15.0], -1.5));

        let mut sup = Supervisor::new(
            SupervisorParams::default(),
            DockNavParams::default(),
            LocMgr::new(&LocParams::default()),
            Box::new(LogIndicator::default()),
        );
        sup.configure_dock_target(dock.target, dock.anchors.clone());

        let dt_s = 0.1;
        let mut input = CycleInput {
            hardware_switch_engaged: true,
            ..Default::default()
        };

        sup.process_cycle(&input);
        sup.request_mode(OperatingMode::AutonomousDock).unwrap();

        let mut last_ordinal = 0;
        for _ in 0..3000 {
            input.now_s += dt_s;

            for m in client.iface().measurements(&dock).iter() {
                sup.loc_mgr_mut().set_measurement(m);
            }

            let cmd = sup.process_cycle(&input);
            assert!(cmd.linear_ms.abs() <= 0.4);

            let ordinal = sup.current_docking_phase().ordinal();
            assert!(ordinal >= last_ordinal);
            last_ordinal = ordinal;

            client.send(&cmd).unwrap();
            client.iface_mut().step(dt_s);

            if sup.current_docking_phase() == DockingPhase::Homed {
                break;
            }
        }

        assert_eq!(sup.current_docking_phase(), DockingPhase::Homed);
        assert_eq!(sup.current_mode(), OperatingMode::AutonomousDock);
        assert!(client.iface().pose().distance_m() < 0.15);
    }
}
