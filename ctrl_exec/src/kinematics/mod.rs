//! Kinematic primitives for a two-wheel differential-drive robot
//!
//! All calculations are made in the horizontal (x, z) plane. A heading of zero faces +z, and a
//! positive heading turns towards +x.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calc_grab_pos;
mod calc_rotate;
mod calc_translate;
mod params;
mod pose;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::Serialize;

use crate::sim::Simulator;

pub use params::DriveParams;
pub use pose::{compute_heading, Pose};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors from the kinematic primitives.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KinematicsError {
    #[error(
        "Target is {distance_cm:.2} cm away, inside the minimum offset radius of {half_width_cm:.2} cm"
    )]
    DegenerateGeometry {
        distance_cm: f64,
        half_width_cm: f64,
    },

    #[error("Wheel velocity must be positive, got {0} rad/s")]
    NonPositiveVelocity(f64),

    #[error("The {0} must be finite")]
    NonFinite(&'static str),
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Wheel angular velocity demands.
///
/// Units: radians/second
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WheelDems {
    pub left_rads: f64,
    pub right_rads: f64,
}

/// A motion computed by one of the primitives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Motion {
    /// Wheel demands to issue, or `None` if no motion is required
    pub wheels: Option<WheelDems>,

    /// Time the motion takes to complete. May be negative for a translation which is already
    /// within range.
    ///
    /// Units: seconds
    pub duration_s: f64,
}

/// Differential-drive kinematics.
#[derive(Debug, Clone, Default)]
pub struct DiffDrive {
    pub(crate) params: DriveParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WheelDems {
    pub const STOP: WheelDems = WheelDems {
        left_rads: 0.0,
        right_rads: 0.0,
    };

    pub fn new(left_rads: f64, right_rads: f64) -> Self {
        Self {
            left_rads,
            right_rads,
        }
    }
}

impl Motion {
    /// A motion which does nothing and completes immediately.
    pub fn none() -> Self {
        Self {
            wheels: None,
            duration_s: 0.0,
        }
    }
}

impl DiffDrive {
    pub fn new(params: DriveParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &DriveParams {
        &self.params
    }

    /// Start turning the robot to face the target, returning the time the turn will complete.
    ///
    /// Issues exactly one wheel command unless the target is too close or already dead ahead, in
    /// which case `now_s` is returned and nothing is issued.
    pub fn rotate_toward(
        &self,
        sim: &mut dyn Simulator,
        target_cm: &Vector3<f64>,
        vel_rads: f64,
        now_s: f64,
    ) -> Result<f64, KinematicsError> {
        let pose = Pose::from_sim(sim);
        let motion = self.calc_rotate(&pose, target_cm, vel_rads)?;

        Ok(self.issue(sim, motion, now_s))
    }

    /// Start driving straight towards the target, returning the time the robot will be within
    /// `range_cm` of it.
    pub fn go_to(
        &self,
        sim: &mut dyn Simulator,
        target_cm: &Vector3<f64>,
        vel_rads: f64,
        range_cm: f64,
        now_s: f64,
    ) -> Result<f64, KinematicsError> {
        let pose = Pose::from_sim(sim);
        let motion = self.calc_translate(&pose, target_cm, vel_rads, range_cm)?;

        Ok(self.issue(sim, motion, now_s))
    }

    /// Stop both wheels.
    pub fn stop(&self, sim: &mut dyn Simulator) {
        sim.set_wheel_velocity(0.0, 0.0);
    }

    fn issue(&self, sim: &mut dyn Simulator, motion: Motion, now_s: f64) -> f64 {
        match motion.wheels {
            Some(w) => {
                sim.set_wheel_velocity(w.left_rads, w.right_rads);
                now_s + motion.duration_s
            }
            None => now_s,
        }
    }

    fn check_vel(vel_rads: f64) -> Result<(), KinematicsError> {
        Self::check_finite("wheel velocity", &[vel_rads])?;

        if vel_rads > 0.0 {
            Ok(())
        } else {
            Err(KinematicsError::NonPositiveVelocity(vel_rads))
        }
    }

    fn check_finite(what: &'static str, values: &[f64]) -> Result<(), KinematicsError> {
        if values.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(KinematicsError::NonFinite(what))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::World;

    #[test]
    fn test_rotate_then_translate() {
        let mut world = World::new();
        let id = world.add_robot("robot_000", Vector3::zeros(), 0.0);
        let drive = DiffDrive::default();
        let target = Vector3::new(50.0, 0.0, 50.0);

        let mut view = world.view(id).unwrap();
        view.set_wheel(drive.params.wheel_radius_cm, drive.params.axle_distance_cm);

        let end_s = drive.rotate_toward(&mut view, &target, 1.0, 2.0).unwrap();
        let expected = drive.params.axle_distance_cm * std::f64::consts::FRAC_PI_4
            / (2.0 * drive.params.wheel_radius_cm);
        assert!((end_s - 2.0 - expected).abs() < 1e-9);
        drop(view);
        assert_eq!(world.wheel_velocity("robot_000"), Some((-1.0, 1.0)));

        // Run the turn to completion in the world, then drive
        let mut t = 0.0;
        while t + 1e-3 <= expected {
            world.step(1e-3);
            t += 1e-3;
        }
        world.step(expected - t);
        let heading = world.heading_of("robot_000").unwrap();
        assert!((heading - std::f64::consts::FRAC_PI_4).abs() < 1e-6);

        let mut view = world.view(id).unwrap();
        let end_s = drive.go_to(&mut view, &target, 4.0, 10.0, 0.0).unwrap();
        let expected = (50f64.hypot(50.0) - 10.0) / (drive.params.wheel_radius_cm * 4.0);
        assert!((end_s - expected).abs() < 1e-9);
        drop(view);
        assert_eq!(world.wheel_velocity("robot_000"), Some((4.0, 4.0)));
    }

    #[test]
    fn test_rotate_is_repeatable() {
        let mut world = World::new();
        let id = world.add_robot("robot_000", Vector3::new(10.0, 0.0, -20.0), 0.3);
        let drive = DiffDrive::default();
        let target = Vector3::new(-40.0, 5.0, 80.0);

        let mut view = world.view(id).unwrap();
        let first = drive.rotate_toward(&mut view, &target, 1.0, 5.0).unwrap();
        let second = drive.rotate_toward(&mut view, &target, 1.0, 5.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_zero_velocity() {
        let drive = DiffDrive::default();
        let pose = Pose::default();
        let target = Vector3::new(0.0, 0.0, 100.0);

        assert_eq!(
            drive.calc_translate(&pose, &target, 0.0, 0.0),
            Err(KinematicsError::NonPositiveVelocity(0.0))
        );
    }

    #[test]
    fn test_rejects_non_finite_inputs() {
        let mut world = World::new();
        let id = world.add_robot("robot_000", Vector3::zeros(), 0.0);
        let drive = DiffDrive::default();
        let pose = Pose::default();

        assert_eq!(
            drive.calc_translate(&pose, &Vector3::new(f64::NAN, 0.0, 50.0), 4.0, 10.0),
            Err(KinematicsError::NonFinite("target"))
        );
        assert_eq!(
            drive.calc_translate(&pose, &Vector3::new(0.0, 0.0, 50.0), 4.0, f64::INFINITY),
            Err(KinematicsError::NonFinite("range"))
        );
        assert_eq!(
            drive.calc_rotate(&pose, &Vector3::new(f64::INFINITY, 0.0, 50.0), 1.0),
            Err(KinematicsError::NonFinite("target"))
        );
        assert_eq!(
            drive.calc_rotate(&pose, &Vector3::new(10.0, 0.0, 50.0), f64::INFINITY),
            Err(KinematicsError::NonFinite("wheel velocity"))
        );

        // Nothing is issued to the wheels
        let mut view = world.view(id).unwrap();
        assert!(drive.go_to(&mut view, &Vector3::new(f64::NAN, 0.0, 0.0), 4.0, 0.0, 0.0).is_err());
        drop(view);
        assert_eq!(world.wheel_velocity("robot_000"), Some((0.0, 0.0)));
    }
}
