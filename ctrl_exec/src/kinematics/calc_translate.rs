//! Straight line drive calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::*;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DiffDrive {
    /// Calculate the straight drive which brings the robot to within `range_cm` of the target.
    ///
    /// There is no near-distance guard, a robot already within range gets a negative duration.
    pub fn calc_translate(
        &self,
        pose: &Pose,
        target_cm: &Vector3<f64>,
        vel_rads: f64,
        range_cm: f64,
    ) -> Result<Motion, KinematicsError> {
        Self::check_vel(vel_rads)?;
        Self::check_finite("target", target_cm.as_slice())?;
        Self::check_finite("range", &[range_cm])?;

        let dist_cm = pose.planar_offset_to(target_cm).norm() - range_cm;
        let speed_cms = self.params.wheel_radius_cm * vel_rads;

        Ok(Motion {
            wheels: Some(WheelDems::new(vel_rads, vel_rads)),
            duration_s: dist_cm / speed_cms,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_translate() {
        let drive = DiffDrive::default();
        let m = drive
            .calc_translate(&Pose::default(), &Vector3::new(50.0, 20.0, 50.0), 4.0, 10.0)
            .unwrap();

        assert_eq!(m.wheels, Some(WheelDems::new(4.0, 4.0)));
        assert!((m.duration_s - (50f64.hypot(50.0) - 10.0) / 40.0).abs() < 1e-12);
    }

    #[test]
    fn test_range_equal_to_distance_is_immediate() {
        let drive = DiffDrive::default();
        let pose = Pose::new(Vector3::new(3.0, 0.0, 4.0), 0.2);
        let m = drive
            .calc_translate(&pose, &Vector3::new(6.0, 0.0, 8.0), 4.0, 5.0)
            .unwrap();

        assert!(m.duration_s.abs() < 1e-12);
    }

    #[test]
    fn test_inside_range_is_negative() {
        let drive = DiffDrive::default();
        let m = drive
            .calc_translate(&Pose::default(), &Vector3::new(0.0, 0.0, 5.0), 4.0, 10.0)
            .unwrap();

        assert!(m.duration_s < 0.0);
    }
}
