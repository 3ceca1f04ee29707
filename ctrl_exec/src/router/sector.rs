//! Sector classification of points around an obstacle

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fmt::Display;

use serde::Serialize;

use super::{Node, Obstacle};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One of the eight sectors around an obstacle, see the module documentation for the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Sector(pub u8);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Sector {
    pub const UPPER_RIGHT: Sector = Sector(0);
    pub const RIGHT: Sector = Sector(1);
    pub const LOWER_RIGHT: Sector = Sector(2);
    pub const BOTTOM: Sector = Sector(3);
    pub const LOWER_LEFT: Sector = Sector(4);
    pub const LEFT: Sector = Sector(5);
    pub const UPPER_LEFT: Sector = Sector(6);
    pub const TOP: Sector = Sector(7);

    /// Returns true for the four corner sectors.
    pub fn is_corner(&self) -> bool {
        self.0 % 2 == 0
    }
}

impl Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sector({})", self.0)
    }
}

impl Obstacle {
    /// Classify a point into one of the eight sectors around this obstacle.
    ///
    /// Points inside the footprint are reported as [`Sector::BOTTOM`].
    pub fn classify(&self, p: &Node) -> Sector {
        if p.x > self.x_max {
            if p.y > self.y_max {
                Sector::UPPER_RIGHT
            } else if p.y > self.y_min {
                Sector::RIGHT
            } else {
                Sector::LOWER_RIGHT
            }
        } else if p.x > self.x_min {
            if p.y >= self.y_max {
                Sector::TOP
            } else {
                Sector::BOTTOM
            }
        } else if p.y > self.y_max {
            Sector::UPPER_LEFT
        } else if p.y > self.y_min {
            Sector::LEFT
        } else {
            Sector::LOWER_LEFT
        }
    }

    /// Pick the edge sector (1, 3, 5 or 7) whose edge is closest to a point on the obstacle.
    ///
    /// Edges are compared in the order top, right, bottom, left, and a later edge only wins if it
    /// is strictly closer. Bottom is returned if no edge is closer than the footprint's
    /// half-perimeter.
    pub fn approach_sector(&self, p: &Node) -> Sector {
        let candidates = [
            (Sector::TOP, self.y_max - p.y),
            (Sector::RIGHT, self.x_max - p.x),
            (Sector::BOTTOM, p.y - self.y_min),
            (Sector::LEFT, p.x - self.x_min),
        ];

        let mut best = Sector::BOTTOM;
        let mut min = self.width + self.height;

        for (sector, dist) in candidates.iter() {
            if *dist < min {
                min = *dist;
                best = *sector;
            }
        }

        best
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_classify() {
        let obs = Obstacle::new(0.0, 0.0, 100.0, 60.0);

        let cases = [
            ((60.0, 40.0), 0),
            ((60.0, 0.0), 1),
            ((60.0, 30.0), 1),
            ((60.0, -30.0), 2),
            ((0.0, -40.0), 3),
            ((0.0, 0.0), 3),
            ((-60.0, -40.0), 4),
            ((-50.0, 0.0), 5),
            ((-60.0, 40.0), 6),
            ((0.0, 30.0), 7),
            ((50.0, 40.0), 7),
        ];

        for ((x, y), s) in cases.iter() {
            assert_eq!(
                obs.classify(&Node::new(*x, *y)),
                Sector(*s),
                "Point ({}, {})",
                x,
                y
            );
        }
    }

    #[test]
    fn test_approach_sector() {
        let obs = Obstacle::new(0.0, 0.0, 100.0, 60.0);

        assert_eq!(obs.approach_sector(&Node::new(0.0, 25.0)), Sector::TOP);
        assert_eq!(obs.approach_sector(&Node::new(45.0, 0.0)), Sector::RIGHT);
        assert_eq!(obs.approach_sector(&Node::new(0.0, -25.0)), Sector::BOTTOM);
        assert_eq!(obs.approach_sector(&Node::new(-45.0, 0.0)), Sector::LEFT);

        // Equidistant from top and right, the first seen wins
        assert_eq!(obs.approach_sector(&Node::new(45.0, 25.0)), Sector::TOP);
    }

    #[test]
    fn test_approach_sector_far_away() {
        let obs = Obstacle::new(0.0, 0.0, 10.0, 10.0);
        let p = Node::new(500.0, 500.0);

        // Every edge distance is negative, so the strict comparison still picks the smallest
        assert_eq!(obs.approach_sector(&p), Sector::RIGHT);
    }
}
