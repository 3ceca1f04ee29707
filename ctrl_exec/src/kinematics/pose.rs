//! Robot pose and heading extraction

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Quaternion, Vector3};
use serde::Serialize;

use crate::sim::Simulator;
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Planar pose of a robot.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Pose {
    /// Position in the world.
    ///
    /// Units: centimeters
    pub position_cm: Vector3<f64>,

    /// Rotation about the y axis, in (-pi, pi].
    ///
    /// Units: radians
    pub heading_rad: f64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Extract the heading from an orientation quaternion, assuming there is no rotation about the x
/// or z axes.
pub fn compute_heading(q: &Quaternion<f64>) -> f64 {
    let theta = 2.0 * clamp(q.w.abs(), 0.0, 1.0).acos();

    if q.w * q.j < 0.0 {
        -theta
    } else {
        theta
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(position_cm: Vector3<f64>, heading_rad: f64) -> Self {
        Self {
            position_cm,
            heading_rad,
        }
    }

    /// Read the current pose of the controlled robot.
    pub fn from_sim(sim: &dyn Simulator) -> Self {
        Self {
            position_cm: sim.my_position(),
            heading_rad: compute_heading(&sim.my_rotation()),
        }
    }

    /// Unit vector the robot is facing.
    pub fn forward(&self) -> Vector3<f64> {
        Vector3::new(self.heading_rad.sin(), 0.0, self.heading_rad.cos())
    }

    pub fn heading_deg(&self) -> f64 {
        self.heading_rad.to_degrees()
    }

    /// Vector from the robot to the target with the vertical component removed.
    pub fn planar_offset_to(&self, target_cm: &Vector3<f64>) -> Vector3<f64> {
        let mut v = target_cm - self.position_cm;
        v.y = 0.0;
        v
    }
}
