//! Parameters structure for the LayoutReporter

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LayoutParams {
    /// Name of the layout service
    pub service: String,

    /// Interval between attempts to connect to the service.
    ///
    /// Units: seconds
    pub tick_period_s: f64,

    /// Entities reported for each kind, in the order they are reported
    pub objects: Vec<String>,
    pub obstacles: Vec<String>,
    pub robots: Vec<String>,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Default for LayoutParams {
    fn default() -> Self {
        let strings = |s: &[&str]| s.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        Self {
            service: String::from("LayoutManager"),
            tick_period_s: 1.0,
            objects: strings(&["can_0", "can_1", "petbottle_0"]),
            obstacles: strings(&["table_0", "trashbox_0", "trashbox_1", "trashbox_2"]),
            robots: strings(&["robot_000"]),
        }
    }
}
