//! # Obstacle-aware router
//!
//! Routes a robot around a single axis-aligned rectangular obstacle by classifying points into
//! eight sectors around the obstacle and inserting inflated corner waypoints between the start and
//! goal sectors. The sectors are laid out as below, sector 3 also covering the obstacle interior:
//!
//! ```text
//!               +y
//!    6  |    7   |   0
//! ------+--------+------
//!    5  |xxxxxxxx|   1     +x
//! ------+--------+------
//!    4  |    3   |   2
//! ```
//!
//! Router coordinates are planar: a node's `y` is the world z coordinate.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calc_route;
mod params;
mod route;
mod sector;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

pub use params::RouterParams;
pub use route::Route;
pub use sector::Sector;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur while routing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    #[error("Obstacle must have a positive width and height, got {0:?}")]
    InvalidObstacle(Obstacle),

    #[error("Route endpoint is not a finite point: {0:?}")]
    NonFinitePoint(Node),
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A planar waypoint.
///
/// Units: centimeters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Node {
    pub x: f64,
    pub y: f64,
}

/// An axis-aligned rectangular obstacle footprint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "ObstacleDef")]
pub struct Obstacle {
    /// Centre of the footprint.
    ///
    /// Units: centimeters
    pub centre: Node,

    /// Units: centimeters
    pub width: f64,

    /// Units: centimeters
    pub height: f64,

    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Parameter file form of an [`Obstacle`], bounds are derived on load.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ObstacleDef {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// The router.
#[derive(Debug, Clone, Default)]
pub struct Router {
    pub(crate) params: RouterParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Node {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Obstacle {
    /// Create a new obstacle centred on `(x, y)`.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            centre: Node::new(x, y),
            width,
            height,
            x_min: x - width / 2.0,
            x_max: x + width / 2.0,
            y_min: y - height / 2.0,
            y_max: y + height / 2.0,
        }
    }

    /// Return a copy of this obstacle moved to a new centre.
    pub fn moved_to(&self, x: f64, y: f64) -> Self {
        Self::new(x, y, self.width, self.height)
    }

    fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.centre.is_finite()
    }
}

impl From<ObstacleDef> for Obstacle {
    fn from(def: ObstacleDef) -> Self {
        Self::new(def.x, def.y, def.width, def.height)
    }
}

impl Router {
    pub fn new(params: RouterParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &RouterParams {
        &self.params
    }
}
