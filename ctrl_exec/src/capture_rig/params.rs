//! Parameters structure for the CaptureRig

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureParams {
    /// Interval between frames of the sweep.
    ///
    /// Units: seconds
    pub tick_period_s: f64,

    /// Interval between ticks once the sweep is over.
    ///
    /// Units: seconds
    pub idle_period_s: f64,

    // ---- SWEEP ----

    /// Centre of the orbit, (x, z).
    ///
    /// Units: centimeters
    pub centre_cm: [f64; 2],

    /// Radius of the orbit.
    ///
    /// Units: centimeters
    pub distance_cm: f64,

    /// Angle between frames.
    ///
    /// Units: degrees
    pub step_deg: f64,

    /// First and last step of the sweep, the orbit angle of step `i` is `i * step_deg - 180`
    pub first_step: i32,
    pub last_step: i32,

    /// Camera the sweep is captured with
    pub sweep_cam_id: u32,

    // ---- MANUAL ----

    /// Camera used by the `capture` message
    pub view_cam_id: u32,

    /// Units: degrees
    pub rotate_step_deg: f64,

    /// Units: centimeters
    pub move_step_cm: f64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Default for CaptureParams {
    fn default() -> Self {
        Self {
            tick_period_s: 0.5,
            idle_period_s: 10.0,
            centre_cm: [0.0, 0.0],
            distance_cm: 50.0,
            step_deg: 9.0,
            first_step: -20,
            last_step: 20,
            sweep_cam_id: 1,
            view_cam_id: 2,
            rotate_step_deg: 45.0,
            move_step_cm: 10.0,
        }
    }
}
