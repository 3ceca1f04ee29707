//! Parameters structure for the TrashBoxZone

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Parameters for a trash box zone.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneParams {
    /// Interval between scans of the scene.
    ///
    /// Units: seconds
    pub tick_period_s: f64,

    /// Half extent of the box opening along x.
    ///
    /// Units: centimeters
    pub half_width_cm: f64,

    /// Half extent of the box opening along z.
    ///
    /// Units: centimeters
    pub half_depth_cm: f64,

    /// Entities are only dropped if their height lies between these bounds.
    ///
    /// Units: centimeters
    pub min_height_cm: f64,
    pub max_height_cm: f64,

    /// Time between the two phases of a drop.
    ///
    /// Units: seconds
    pub drop_delay_s: f64,

    /// Entities which are never dropped
    pub exclusions: Vec<String>,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Default for ZoneParams {
    fn default() -> Self {
        Self {
            tick_period_s: 1.0,
            half_width_cm: 10.0,
            half_depth_cm: 20.25,
            min_height_cm: 40.0,
            max_height_cm: 1000.0,
            drop_delay_s: 0.5,
            exclusions: ["robot_000", "trashbox_0", "trashbox_1", "trashbox_2"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}
