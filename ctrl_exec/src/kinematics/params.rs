//! Parameters structure for the kinematic primitives

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive geometry and motion speeds.
#[derive(Debug, Clone, Deserialize)]
pub struct DriveParams {
    // ---- GEOMETRY ----

    /// The radius of the robot's wheels.
    ///
    /// Units: centimeters
    pub wheel_radius_cm: f64,

    /// The distance between the two wheels.
    ///
    /// Units: centimeters
    pub axle_distance_cm: f64,

    /// Half the width of the robot's shoulders, the sideways offset of the arm from the body
    /// centreline.
    ///
    /// Units: centimeters
    pub shoulder_half_width_cm: f64,

    // ---- SPEEDS ----

    /// Wheel rate used for turning on the spot.
    ///
    /// Units: radians/second
    pub rotate_vel_rads: f64,

    /// Wheel rate used for driving straight.
    ///
    /// Units: radians/second
    pub translate_vel_rads: f64,

    /// Rate at which arm joints are moved.
    ///
    /// Units: radians/second
    pub joint_vel_rads: f64,

    /// Angle each arm motion sweeps through.
    ///
    /// Units: degrees
    pub arm_swing_deg: f64,

    // ---- THRESHOLDS ----

    /// Targets closer than this (squared planar distance) need no turn.
    ///
    /// Units: centimeters^2
    pub near_threshold_cm2: f64,
}

impl DriveParams {
    /// Time taken for one arm motion.
    ///
    /// Units: seconds
    pub fn arm_swing_duration_s(&self) -> f64 {
        if self.joint_vel_rads > 0.0 {
            self.arm_swing_deg.to_radians() / self.joint_vel_rads
        } else {
            0.0
        }
    }
}

impl Default for DriveParams {
    fn default() -> Self {
        Self {
            wheel_radius_cm: 10.0,
            axle_distance_cm: 10.0,
            shoulder_half_width_cm: 16.5,
            rotate_vel_rads: 1.0,
            translate_vel_rads: 4.0,
            joint_vel_rads: 0.6,
            arm_swing_deg: 50.0,
            near_threshold_cm2: 1.0,
        }
    }
}
