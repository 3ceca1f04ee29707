//! Turn-on-the-spot calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::*;
use util::maths::{clamp, wrap_pi};

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DiffDrive {
    /// Calculate the turn needed for the robot at `pose` to face `target_cm`.
    pub fn calc_rotate(
        &self,
        pose: &Pose,
        target_cm: &Vector3<f64>,
        vel_rads: f64,
    ) -> Result<Motion, KinematicsError> {
        Self::check_vel(vel_rads)?;
        Self::check_finite("target", target_cm.as_slice())?;

        let offset = pose.planar_offset_to(target_cm);
        let dist_sq = offset.norm_squared();

        if dist_sq < self.params.near_threshold_cm2 {
            return Ok(Motion::none());
        }

        // Angle between +z and the target, signed so that targets towards +x are negative
        let cos = clamp(offset.z / dist_sq.sqrt(), -1.0, 1.0);
        let mut angle_rad = cos.acos();
        if offset.x > 0.0 {
            angle_rad = -angle_rad;
        }
        let angle_rad = wrap_pi(angle_rad + pose.heading_rad);

        if angle_rad == 0.0 {
            return Ok(Motion::none());
        }

        // Each wheel travels along a circle with the axle as its diameter
        let arc_cm = self.params.axle_distance_cm * angle_rad.abs() / 2.0;
        let speed_cms = self.params.wheel_radius_cm * vel_rads;

        let wheels = if angle_rad > 0.0 {
            WheelDems::new(vel_rads, -vel_rads)
        } else {
            WheelDems::new(-vel_rads, vel_rads)
        };

        Ok(Motion {
            wheels: Some(wheels),
            duration_s: arc_cm / speed_cms,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn drive() -> DiffDrive {
        DiffDrive::default()
    }

    #[test]
    fn test_eighth_turn_towards_x() {
        // Target at +x needs the heading to increase, right wheel forward
        let m = drive()
            .calc_rotate(&Pose::default(), &Vector3::new(50.0, 0.0, 50.0), 1.0)
            .unwrap();

        assert_eq!(m.wheels, Some(WheelDems::new(-1.0, 1.0)));
        assert!((m.duration_s - 10.0 * FRAC_PI_4 / 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_turn_right() {
        let pose = Pose::new(Vector3::zeros(), FRAC_PI_2);
        let m = drive()
            .calc_rotate(&pose, &Vector3::new(0.0, 0.0, 100.0), 2.0)
            .unwrap();

        assert_eq!(m.wheels, Some(WheelDems::new(2.0, -2.0)));
        assert!((m.duration_s - 10.0 * FRAC_PI_2 / 40.0).abs() < 1e-12);
    }

    #[test]
    fn test_wraps_the_short_way() {
        // Facing almost -z, target just to the other side of -z
        let pose = Pose::new(Vector3::zeros(), PI - 0.1);
        let target = Vector3::new(-(0.1f64).sin() * 100.0, 0.0, -(0.1f64).cos() * 100.0);
        let m = drive().calc_rotate(&pose, &target, 1.0).unwrap();

        assert_eq!(m.wheels, Some(WheelDems::new(-1.0, 1.0)));
        assert!((m.duration_s - 10.0 * 0.2 / 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_near_target_needs_no_turn() {
        let pose = Pose::new(Vector3::new(5.0, 0.0, 5.0), 1.0);
        let m = drive()
            .calc_rotate(&pose, &Vector3::new(5.5, 30.0, 5.5), 1.0)
            .unwrap();

        assert_eq!(m, Motion::none());
    }

    #[test]
    fn test_dead_ahead_needs_no_turn() {
        let m = drive()
            .calc_rotate(&Pose::default(), &Vector3::new(0.0, 0.0, 80.0), 1.0)
            .unwrap();

        assert_eq!(m, Motion::none());
    }
}
