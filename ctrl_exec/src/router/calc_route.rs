//! Route calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, trace};

use super::*;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Router {
    /// Get the standoff point to occupy before reaching for an object on an obstacle.
    ///
    /// The object point is moved out by the arm reach, away from the obstacle edge it is nearest
    /// to.
    pub fn grab_position(&self, object: &Node, obstacle: &Obstacle) -> Node {
        let reach = self.params.arm_reach_cm;

        match obstacle.approach_sector(object) {
            Sector::TOP => Node::new(object.x, object.y + reach),
            Sector::RIGHT => Node::new(object.x + reach, object.y),
            Sector::LEFT => Node::new(object.x - reach, object.y),
            _ => Node::new(object.x, object.y - reach),
        }
    }

    /// Calculate a route from `start` to `goal` around one obstacle.
    ///
    /// If both points are in the same sector the direct route is returned. Otherwise the sector
    /// index is stepped from the start's sector towards the goal's, and at each corner sector
    /// passed an inflated corner waypoint is inserted, unless the goal already lies beyond that
    /// corner on both axes.
    ///
    /// Sector indices are stepped numerically rather than around the ring of sectors, so some
    /// sector pairs (e.g. 0 and 6) take the long way round.
    pub fn calc_route(
        &self,
        start: &Node,
        goal: &Node,
        obstacle: &Obstacle,
    ) -> Result<Vec<Node>, RouteError> {
        Self::check(start, goal, obstacle)?;

        let mut route = vec![*start, *goal];

        let mut idx = obstacle.classify(start).0 as i32;
        let goal_idx = obstacle.classify(goal).0 as i32;

        if idx == goal_idx {
            return Ok(route);
        }

        let step = if idx < goal_idx { 1 } else { -1 };
        let half_w = obstacle.width / 2.0 + self.params.corner_clearance_cm;
        let half_h = obstacle.height / 2.0 + self.params.corner_clearance_cm;
        let c = obstacle.centre;

        while idx != goal_idx {
            idx += step;

            // Corner waypoint and whether the goal is already beyond it
            let corner = match idx {
                0 => {
                    let n = Node::new(c.x + half_w, c.y + half_h);
                    Some((n, goal.x >= n.x && goal.y >= n.y))
                }
                2 => {
                    let n = Node::new(c.x + half_w, c.y - half_h);
                    Some((n, goal.x >= n.x && goal.y <= n.y))
                }
                4 => {
                    let n = Node::new(c.x - half_w, c.y - half_h);
                    Some((n, goal.x <= n.x && goal.y <= n.y))
                }
                6 => {
                    let n = Node::new(c.x - half_w, c.y + half_h);
                    Some((n, goal.x <= n.x && goal.y >= n.y))
                }
                _ => None,
            };

            match corner {
                Some((_, true)) => {
                    if idx == goal_idx {
                        break;
                    }
                }
                Some((n, false)) => {
                    trace!("Inserting corner waypoint {:?} for sector {}", n, idx);
                    let goal_pos = route.len() - 1;
                    route.insert(goal_pos, n);
                }
                None => (),
            }
        }

        Ok(route)
    }

    /// Calculate a route around the first two obstacles of a room.
    ///
    /// A route is first calculated around the first obstacle. Each of its segments is then
    /// re-routed around the second obstacle, splicing in any waypoints that produces. If the
    /// result is longer than the maximum route length the single obstacle route is used instead.
    ///
    /// Every segment is re-routed, not only the first one which crosses the second obstacle, so a
    /// route which crosses it more than once gets a detour at each crossing.
    pub fn calc_full_route(
        &self,
        start: &Node,
        goal: &Node,
        obstacles: &[Obstacle],
    ) -> Result<Vec<Node>, RouteError> {
        let first = match obstacles.first() {
            Some(o) => o,
            None => return Ok(vec![*start, *goal]),
        };

        let base = self.calc_route(start, goal, first)?;

        let second = match obstacles.get(1) {
            Some(o) => o,
            None => return Ok(base),
        };

        let mut route = Vec::with_capacity(base.len());
        route.push(base[0]);

        for pair in base.windows(2) {
            let sub = self.calc_route(&pair[0], &pair[1], second)?;
            route.extend_from_slice(&sub[1..]);
        }

        if route.len() > self.params.max_full_route_nodes {
            debug!(
                "Full route has {} nodes (max {}), falling back to the single obstacle route",
                route.len(),
                self.params.max_full_route_nodes
            );
            return Ok(base);
        }

        Ok(route)
    }

    fn check(start: &Node, goal: &Node, obstacle: &Obstacle) -> Result<(), RouteError> {
        if !obstacle.is_valid() {
            return Err(RouteError::InvalidObstacle(*obstacle));
        }
        for p in [start, goal].iter() {
            if !p.is_finite() {
                return Err(RouteError::NonFinitePoint(**p));
            }
        }
        Ok(())
    }
}
