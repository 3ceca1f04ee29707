//! Side-approach point for the offset arm

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::*;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DiffDrive {
    /// Calculate the point the robot must face so that its arm, offset from the body centreline
    /// by `half_width_cm`, lines up with the target.
    ///
    /// The returned point keeps the target's height.
    pub fn calc_grab_pos(
        &self,
        pose: &Pose,
        target_cm: &Vector3<f64>,
        half_width_cm: f64,
    ) -> Result<Vector3<f64>, KinematicsError> {
        Self::check_finite("target", target_cm.as_slice())?;

        let offset = pose.planar_offset_to(target_cm);
        let dist_cm = offset.norm();

        if dist_cm <= half_width_cm {
            return Err(KinematicsError::DegenerateGeometry {
                distance_cm: dist_cm,
                half_width_cm,
            });
        }

        let (s, c) = (half_width_cm / dist_cm).asin().sin_cos();

        Ok(Vector3::new(
            pose.position_cm.x + c * offset.x + s * offset.z,
            target_cm.y,
            pose.position_cm.z + c * offset.z - s * offset.x,
        ))
    }
}
