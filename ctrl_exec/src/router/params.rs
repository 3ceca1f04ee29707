//! Parameters structure for the router

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the obstacle-aware router.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterParams {
    /// Distance the grab standoff point is placed out from the object.
    ///
    /// Units: centimeters
    pub arm_reach_cm: f64,

    /// Clearance added to each obstacle corner when inserting a corner waypoint.
    ///
    /// Units: centimeters
    pub corner_clearance_cm: f64,

    /// Longest route (in nodes) accepted from the two-obstacle refinement before falling back to
    /// the single obstacle route.
    pub max_full_route_nodes: usize,
}

impl Default for RouterParams {
    fn default() -> Self {
        Self {
            arm_reach_cm: 18.0,
            corner_clearance_cm: 60.0,
            max_full_route_nodes: 10,
        }
    }
}
